//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (identity cookie, CORS,
//! compression, tracing), and creates the axum router ready for serving.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::identity::identify_user;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.client_url.as_deref());

    Router::new()
        .route("/health", get(handlers::health_check))
        // Posts
        .route("/posts", get(handlers::list_posts))
        .route("/posts/{id}", get(handlers::get_post))
        // Comments
        .route("/posts/{id}/comments", post(handlers::create_comment))
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}/toggleLike",
            post(handlers::toggle_like),
        )
        .layer(middleware::from_fn_with_state(state.clone(), identify_user))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the configured client origin; permissive otherwise.
fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    match client_url.and_then(|url| HeaderValue::from_str(url).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{FullRepository, PostRepository, UserRepository};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app() -> (Router, crate::models::UserId) {
        let repo = LocalRepository::new();
        let user = repo.create_user("Yasu").await.unwrap();
        repo.create_post("Post 1", "Body").await.unwrap();
        let repo = Arc::new(repo) as Arc<dyn FullRepository>;
        (create_router(AppState::new(repo, user.id)), user.id)
    }

    #[tokio::test]
    async fn test_router_creation() {
        let (_router, _) = test_app().await;
    }

    #[tokio::test]
    async fn test_health_sets_user_cookie() {
        let (router, user) = test_app().await;
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with(&format!("userId={}", user)));
        assert!(cookie.contains("HttpOnly"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], "connected");
    }

    #[tokio::test]
    async fn test_matching_cookie_is_not_reissued() {
        let (router, user) = test_app().await;
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/posts")
                    .header(header::COOKIE, format!("userId={}", user))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_unknown_post_id_is_rejected() {
        let (router, _) = test_app().await;
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/posts/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_stale_or_foreign_cookie_is_replaced() {
        let stale = crate::models::UserId::generate().to_string();
        for sent in [stale.as_str(), "not-a-uuid"] {
            let (router, user) = test_app().await;
            let response = router
                .oneshot(
                    Request::builder()
                        .uri("/posts")
                        .header(header::COOKIE, format!("theme=dark; userId={}", sent))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let cookie = response
                .headers()
                .get(header::SET_COOKIE)
                .unwrap()
                .to_str()
                .unwrap()
                .to_string();
            assert_eq!(cookie, format!("userId={}; Path=/; HttpOnly", user));
        }
    }

    #[test]
    fn test_cors_layer_variants() {
        let _ = cors_layer(Some("http://localhost:3000"));
        let _ = cors_layer(None);
    }
}
