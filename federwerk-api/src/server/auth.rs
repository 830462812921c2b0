use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use federwerk_common::model::{
    Id,
    session::SessionToken,
    user::{User, UserMarker, Username},
};
use federwerk_db::client::DbClient;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The caller's identity, resolved from the bearer session token.
///
/// Any request without a live session is bounced to the sign-in route with
/// the original path as the return target, so handlers taking this extractor
/// never see anonymous callers.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(&self) -> Id<UserMarker> {
        self.user.id
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.user.username
    }
}

/// Like [`AuthenticatedUser`] for routes that are public but render
/// viewer-dependent details, e.g. the profile following flag.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct MaybeAuthenticatedUser(pub Option<AuthenticatedUser>);

fn sign_in_redirect(parts: &Parts) -> ServerError {
    let next = parts
        .uri
        .path_and_query()
        .map_or("/", |path_and_query| path_and_query.as_str())
        .to_owned();

    ServerError::NotSignedIn { next }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(header) = AuthorizationHeader::from_request_parts(parts, state).await else {
            return Err(sign_in_redirect(parts));
        };
        let Ok(token) = header.token().parse::<SessionToken>() else {
            return Err(sign_in_redirect(parts));
        };

        let token_hash = token.hash()?;

        let Some(session) = Arc::<DbClient>::from_ref(state)
            .fetch_session(&token_hash)
            .await?
        else {
            return Err(sign_in_redirect(parts));
        };

        if session.is_expired(UtcDateTime::now()) {
            return Err(sign_in_redirect(parts));
        }

        Ok(Self { user: session.user })
    }
}

impl<S> FromRequestParts<S> for MaybeAuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthenticatedUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(ServerError::NotSignedIn { .. }) => Ok(Self(None)),
            Err(other) => Err(other),
        }
    }
}
