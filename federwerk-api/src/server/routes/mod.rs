use crate::server::ServerRouter;
use federwerk_common::model::post::Post;
use federwerk_db::page::Page;
use serde::Serialize;

mod groups;
mod posts;
mod profiles;
mod sessions;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(posts::routes())
        .merge(groups::routes())
        .merge(profiles::routes())
        .merge(sessions::routes())
}

/// Response shape shared by every paginated post listing.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub(crate) struct Timeline {
    pub posts: Vec<Post>,
    pub page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<Page<Post>> for Timeline {
    fn from(page: Page<Post>) -> Self {
        let has_next = page.has_next();
        let has_previous = page.has_previous();

        Self {
            posts: page.items,
            page: page.number,
            total_pages: page.total_pages,
            has_next,
            has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerState, cache::ResponseCache, routes};
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use federwerk_db::client::DbClient;
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    /// State whose database client never connects; good enough for routes
    /// that reject before touching the store.
    fn detached_state() -> ServerState {
        let db_client = DbClient::connect_lazy("postgres://localhost/federwerk", 10)
            .expect("Lazy pool creation does not connect");

        ServerState {
            db_client: Arc::new(db_client),
            home_cache: ResponseCache::new(Duration::from_secs(20)),
        }
    }

    async fn get(uri: &str) -> axum::response::Response {
        routes()
            .with_state(detached_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        assert_eq!(get("/unexisting_page/").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn anonymous_caller_is_redirected_to_sign_in() {
        for uri in ["/create/", "/follow/"] {
            let response = get(uri).await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(
                response.headers()[header::LOCATION],
                format!("/auth/login/?next={uri}")
            );
        }
    }

    #[tokio::test]
    async fn anonymous_edit_keeps_the_full_return_path() {
        let response = routes()
            .with_state(detached_state())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/posts/5/edit/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login/?next=/posts/5/edit/"
        );
    }
}
