use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, query::PageQuery,
    routes::Timeline,
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use federwerk_common::model::group::{Group, GroupDraft, GroupSlug};
use federwerk_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_groups)
        .typed_post(create_group)
        .typed_get(group_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/group/", rejection(ServerError))]
struct GroupIndexPath();

async fn list_groups(
    GroupIndexPath(): GroupIndexPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Group>>> {
    let groups = db.list_groups().await?;

    Ok(Json(groups))
}

async fn create_group(
    GroupIndexPath(): GroupIndexPath,
    State(db): State<Arc<DbClient>>,
    _user: AuthenticatedUser,
    Json(draft): Json<GroupDraft>,
) -> Result<Json<Group>> {
    let group = db.create_group(&draft).await?;

    Ok(Json(group))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/group/{slug}/", rejection(ServerError))]
struct GroupPostsPath {
    slug: GroupSlug,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct GroupTimeline {
    group: Group,
    #[serde(flatten)]
    timeline: Timeline,
}

async fn group_posts(
    GroupPostsPath { slug }: GroupPostsPath,
    Query(page_query): Query<PageQuery>,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<GroupTimeline>> {
    let group = db
        .fetch_group_by_slug(&slug)
        .await?
        .ok_or(ServerError::GroupBySlugNotFound(slug))?;

    let timeline = Timeline::from(db.group_timeline(group.id, page_query.request()).await?);

    Ok(Json(GroupTimeline { group, timeline }))
}
