use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    cache::ResponseCache,
    json::Json,
    query::PageQuery,
    routes::Timeline,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    TypedHeader,
    routing::{RouterExt, TypedPath},
};
use federwerk_common::model::{
    Id,
    comment::{Comment, CommentDraft},
    group::GroupMarker,
    post::{Post, PostDraft, PostMarker},
};
use federwerk_db::{client::DbClient, page::PageRequest};
use headers::ContentType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(home)
        .typed_get(get_post)
        .typed_get(new_post_form)
        .typed_post(create_post)
        .typed_get(edit_post_form)
        .typed_post(edit_post)
        .typed_post(delete_post)
        .typed_post(add_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct HomePath();

/// Requests below the first page share one key; they all resolve to the last
/// page, whichever number that currently is.
fn home_cache_key(request: PageRequest) -> u32 {
    match request {
        PageRequest::Number(number) => number,
        PageRequest::Last => 0,
    }
}

fn cached_json(body: Bytes) -> Response {
    (TypedHeader(ContentType::json()), body).into_response()
}

/// The home timeline is the one cached page: within the TTL every caller gets
/// the previously rendered bytes, deletions included. The key is the page
/// number alone, which is only sound while nothing on this page depends on
/// who is asking.
async fn home(
    HomePath(): HomePath,
    Query(page_query): Query<PageQuery>,
    State(db): State<Arc<DbClient>>,
    State(cache): State<ResponseCache<u32>>,
) -> Result<Response> {
    let requested = page_query.request();
    let cache_key = home_cache_key(requested);

    if let Some(body) = cache.get(&cache_key).await {
        return Ok(cached_json(body));
    }

    let timeline = Timeline::from(db.home_timeline(requested).await?);
    let body = Bytes::from(serde_json::to_vec(&timeline)?);
    cache.insert(cache_key, body.clone()).await;

    Ok(cached_json(body))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/", rejection(ServerError))]
struct PostDetailPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct PostDetail {
    post: Post,
    comments: Vec<Comment>,
}

async fn get_post(
    PostDetailPath { id }: PostDetailPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<PostDetail>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    let comments = db.post_comments(id).await?;

    Ok(Json(PostDetail { post, comments }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/create/", rejection(ServerError))]
struct NewPostPath();

/// The form shape for creating and editing posts; blank for a new post,
/// prefilled when editing.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
struct PostForm {
    text: String,
    group: Option<Id<GroupMarker>>,
    image: Option<String>,
}

async fn new_post_form(NewPostPath(): NewPostPath, _user: AuthenticatedUser) -> Json<PostForm> {
    Json(PostForm::default())
}

async fn create_post(
    NewPostPath(): NewPostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<PostDraft>,
) -> Result<Redirect> {
    db.create_post(user.user_id(), &draft).await?;

    Ok(Redirect::to(&format!("/profile/{}/", user.username())))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/edit/", rejection(ServerError))]
struct EditPostPath {
    id: Id<PostMarker>,
}

async fn edit_post_form(
    EditPostPath { id }: EditPostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<PostForm>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.author.id != user.user_id() {
        return Err(ServerError::NotPostAuthor(id));
    }

    Ok(Json(PostForm {
        text: post.text.into_inner(),
        group: post.group.map(|group| group.id),
        image: post.image,
    }))
}

async fn edit_post(
    EditPostPath { id }: EditPostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<PostDraft>,
) -> Result<Redirect> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.author.id != user.user_id() {
        return Err(ServerError::NotPostAuthor(id));
    }

    db.update_post(id, &draft).await?;

    Ok(Redirect::to(&format!("/posts/{id}/")))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/delete/", rejection(ServerError))]
struct DeletePostPath {
    id: Id<PostMarker>,
}

async fn delete_post(
    DeletePostPath { id }: DeletePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Redirect> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.author.id != user.user_id() {
        return Err(ServerError::NotPostAuthor(id));
    }

    db.delete_post(id).await?;

    Ok(Redirect::to(&format!("/profile/{}/", user.username())))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comment/", rejection(ServerError))]
struct AddCommentPath {
    id: Id<PostMarker>,
}

async fn add_comment(
    AddCommentPath { id }: AddCommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<CommentDraft>,
) -> Result<Redirect> {
    db.fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    db.create_comment(id, user.user_id(), &draft).await?;

    Ok(Redirect::to(&format!("/posts/{id}/")))
}
