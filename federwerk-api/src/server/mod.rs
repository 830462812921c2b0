use crate::server::{cache::ResponseCache, json::Json};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use federwerk_common::model::{
    Id,
    group::GroupSlug,
    post::PostMarker,
    session::{PasswordError, SessionTokenHashError},
    user::Username,
};
use federwerk_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

pub mod auth;
pub mod cache;

mod json;
mod query;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub home_cache: ResponseCache<u32>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authenticated route was requested without a valid session")]
    NotSignedIn { next: String },
    #[error("The session token could not be hashed: {0}")]
    SessionTokenHash(#[from] SessionTokenHashError),
    #[error("Password processing failed: {0}")]
    Password(#[from] PasswordError),
    #[error("Username and password did not match")]
    WrongCredentials,
    #[error("Username {0} is already taken")]
    UsernameTaken(Username),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("User with username {0} was not found.")]
    UserByUsernameNotFound(Username),
    #[error("Group with slug {0} was not found.")]
    GroupBySlugNotFound(GroupSlug),
    #[error("Post with id {0} belongs to someone else.")]
    NotPostAuthor(Id<PostMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::UserByUsernameNotFound(_)
            | ServerError::GroupBySlugNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::JsonRejection(_) => StatusCode::BAD_REQUEST,
            ServerError::WrongCredentials => StatusCode::UNAUTHORIZED,
            ServerError::UsernameTaken(_) => StatusCode::CONFLICT,
            ServerError::NotSignedIn { .. } | ServerError::NotPostAuthor(_) => {
                StatusCode::SEE_OTHER
            }
            ServerError::JsonResponse(_)
            | ServerError::SessionTokenHash(_)
            | ServerError::Password(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::NotSignedIn { next } => {
                debug!(%next, "Redirecting unauthenticated request to sign-in");

                Redirect::to(&format!("/auth/login/?next={next}")).into_response()
            }
            ServerError::NotPostAuthor(post) => {
                debug!(%post, "Redirecting non-author back to the post");

                Redirect::to(&format!("/posts/{post}/")).into_response()
            }
            other => {
                let status = other.status();

                error!(error = %other, %status, "Replying with error");

                let error_response = ErrorResponse {
                    status: status.as_u16(),
                };
                (status, Json(error_response)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::ServerError;
    use axum::{
        http::{StatusCode, header},
        response::IntoResponse,
    };

    #[test]
    fn sign_in_redirect_carries_return_path() {
        let response = ServerError::NotSignedIn {
            next: "/create/".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login/?next=/create/"
        );
    }

    #[test]
    fn non_author_is_sent_back_to_the_post() {
        let response = ServerError::NotPostAuthor(7.into()).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/posts/7/");
    }

    #[test]
    fn missing_entities_are_not_found() {
        assert_eq!(
            ServerError::PostByIdNotFound(1.into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::UnknownRoute("/unexisting_page/".parse().unwrap()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
