use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, MaybeAuthenticatedUser},
    json::Json,
    query::PageQuery,
    routes::Timeline,
};
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::routing::{RouterExt, TypedPath};
use federwerk_common::model::user::{User, Username};
use federwerk_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(profile)
        .typed_get(follow)
        .typed_get(unfollow)
        .typed_get(followed_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/", rejection(ServerError))]
struct ProfilePath {
    username: Username,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct Profile {
    author: User,
    /// Whether the viewer follows this author; false for anonymous viewers.
    /// Never cached, so it reflects the store at request time.
    following: bool,
    #[serde(flatten)]
    timeline: Timeline,
}

async fn profile(
    ProfilePath { username }: ProfilePath,
    Query(page_query): Query<PageQuery>,
    State(db): State<Arc<DbClient>>,
    viewer: MaybeAuthenticatedUser,
) -> Result<Json<Profile>> {
    let author = db
        .fetch_user_by_username(&username)
        .await?
        .ok_or(ServerError::UserByUsernameNotFound(username))?;

    let following = match &viewer.0 {
        Some(viewer) => db.is_following(viewer.user_id(), author.id).await?,
        None => false,
    };

    let timeline = Timeline::from(db.author_timeline(author.id, page_query.request()).await?);

    Ok(Json(Profile {
        author,
        following,
        timeline,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/follow/", rejection(ServerError))]
struct FollowPath {
    username: Username,
}

async fn follow(
    FollowPath { username }: FollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Redirect> {
    let author = db
        .fetch_user_by_username(&username)
        .await?
        .ok_or(ServerError::UserByUsernameNotFound(username))?;

    db.follow(user.user_id(), author.id).await?;

    Ok(Redirect::to(&format!("/profile/{}/", author.username)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/unfollow/", rejection(ServerError))]
struct UnfollowPath {
    username: Username,
}

async fn unfollow(
    UnfollowPath { username }: UnfollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Redirect> {
    let author = db
        .fetch_user_by_username(&username)
        .await?
        .ok_or(ServerError::UserByUsernameNotFound(username))?;

    db.unfollow(user.user_id(), author.id).await?;

    Ok(Redirect::to(&format!("/profile/{}/", author.username)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follow/", rejection(ServerError))]
struct FollowFeedPath();

/// The personalized feed is keyed to the caller and therefore must never go
/// through the shared home cache.
async fn followed_posts(
    FollowFeedPath(): FollowFeedPath,
    Query(page_query): Query<PageQuery>,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Timeline>> {
    let page = db
        .followed_timeline(user.user_id(), page_query.request())
        .await?;

    Ok(Json(Timeline::from(page)))
}
