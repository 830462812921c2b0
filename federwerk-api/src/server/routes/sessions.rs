use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use federwerk_common::model::{
    session::{SESSION_LIFETIME, Session, SessionToken, hash_password, verify_password},
    user::{User, Username},
};
use federwerk_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::UtcDateTime;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(signup)
        .typed_get(login_form)
        .typed_post(login)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/signup/", rejection(ServerError))]
struct SignupPath();

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct SignupRequest {
    username: Username,
    password: String,
}

async fn signup(
    SignupPath(): SignupPath,
    State(db): State<Arc<DbClient>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<User>> {
    let password_hash = hash_password(&request.password)?;

    let id = db
        .create_user(&request.username, &password_hash)
        .await
        .map_err(|error| {
            if error.is_unique_violation() {
                ServerError::UsernameTaken(request.username.clone())
            } else {
                ServerError::Database(error)
            }
        })?;

    Ok(Json(User {
        id,
        username: request.username,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/login/", rejection(ServerError))]
struct LoginPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
struct LoginPrompt {
    /// Path to return to after signing in, echoed from the redirect that led
    /// here.
    next: Option<String>,
}

async fn login_form(LoginPath(): LoginPath, Query(query): Query<NextQuery>) -> Json<LoginPrompt> {
    Json(LoginPrompt { next: query.next })
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct LoginRequest {
    username: Username,
    password: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: User,
}

async fn login(
    LoginPath(): LoginPath,
    State(db): State<Arc<DbClient>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let credentials = db
        .fetch_credentials(&request.username)
        .await?
        .ok_or(ServerError::WrongCredentials)?;

    if !verify_password(&request.password, &credentials.password_hash)? {
        return Err(ServerError::WrongCredentials);
    }

    let token = SessionToken::generate_random(credentials.user.id.get());
    let now = UtcDateTime::now();
    let session = Session {
        user: credentials.user.clone(),
        token_hash: token.hash()?,
        created_at: now,
        expires_at: now + SESSION_LIFETIME,
    };
    db.create_session(&session).await?;

    Ok(Json(LoginResponse {
        token: token.as_token_str(),
        user: credentials.user,
    }))
}
