mod support;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use nested_comments::db::repository::{CommentRepository, LikeRepository};
use nested_comments::models::{CommentId, Like, NewComment, PostId, User};
use support::Fixture;

async fn send(
    router: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed_comment(
    fx: &Fixture,
    author: &User,
    parent: Option<CommentId>,
    message: &str,
) -> CommentId {
    fx.repo
        .create_comment(&NewComment {
            post_id: fx.post.id,
            user_id: author.id,
            parent_id: parent,
            message: message.to_string(),
        })
        .await
        .unwrap()
        .comment
        .id
}

#[tokio::test]
async fn test_list_posts_returns_id_and_title() {
    let fx = Fixture::new().await;
    let (status, body) = send(fx.router(), Method::GET, "/posts", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": fx.post.id.to_string(), "title": "Post 1" }]));
}

#[tokio::test]
async fn test_get_post_shapes_comments() {
    let fx = Fixture::new().await;
    let root = seed_comment(&fx, &fx.sally, None, "root").await;
    let reply = seed_comment(&fx, &fx.yasu, Some(root), "reply").await;
    fx.repo
        .create_like(Like {
            user_id: fx.yasu.id,
            comment_id: root,
        })
        .await
        .unwrap();
    fx.repo
        .create_like(Like {
            user_id: fx.sally.id,
            comment_id: root,
        })
        .await
        .unwrap();

    let uri = format!("/posts/{}", fx.post.id);
    let (status, body) = send(fx.router(), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Post 1");
    assert_eq!(body["body"], "Lorem ipsum");

    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    // Newest first
    assert_eq!(comments[0]["id"], reply.to_string());
    assert_eq!(comments[0]["parentId"], root.to_string());
    assert_eq!(comments[0]["likeCount"], 0);
    assert_eq!(comments[0]["likedByMe"], false);
    assert_eq!(comments[1]["parentId"], Value::Null);
    assert_eq!(comments[1]["likeCount"], 2);
    assert_eq!(comments[1]["likedByMe"], true);
    assert_eq!(comments[1]["user"]["name"], "Sally");
}

#[tokio::test]
async fn test_get_missing_post_is_404() {
    let fx = Fixture::new().await;
    let uri = format!("/posts/{}", PostId::generate());
    let (status, body) = send(fx.router(), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_comment_and_reply() {
    let fx = Fixture::new().await;
    let uri = format!("/posts/{}/comments", fx.post.id);

    let (status, root) = send(fx.router(), Method::POST, &uri, Some(json!({ "message": "Hello" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(root["message"], "Hello");
    assert_eq!(root["user"]["id"], fx.yasu.id.to_string());
    assert_eq!(root["likeCount"], 0);
    assert_eq!(root["likedByMe"], false);

    let (status, reply) = send(
        fx.router(),
        Method::POST,
        &uri,
        Some(json!({ "message": "Hi back", "parentId": root["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["parentId"], root["id"]);
    assert_eq!(fx.repo.comment_count(), 2);
}

#[tokio::test]
async fn test_create_comment_rejects_blank_message() {
    let fx = Fixture::new().await;
    let uri = format!("/posts/{}/comments", fx.post.id);

    for body in [json!({}), json!({ "message": "" }), json!({ "message": "  \n" })] {
        let (status, error) = send(fx.router(), Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["message"], "Message is required");
    }
    assert_eq!(fx.repo.comment_count(), 0);
}

#[tokio::test]
async fn test_null_message_is_required_error() {
    let fx = Fixture::new().await;
    let mine = seed_comment(&fx, &fx.yasu, None, "mine").await;

    let uri = format!("/posts/{}/comments", fx.post.id);
    let (status, body) = send(fx.router(), Method::POST, &uri, Some(json!({ "message": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message is required");

    let uri = format!("/posts/{}/comments/{}", fx.post.id, mine);
    let (status, body) = send(fx.router(), Method::PUT, &uri, Some(json!({ "message": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message is required");
    assert_eq!(fx.repo.get_comment(mine).await.unwrap().message, "mine");
}

#[tokio::test]
async fn test_malformed_body_uses_error_body() {
    let fx = Fixture::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/posts/{}/comments", fx.post.id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = fx.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(!body["message"].as_str().unwrap().is_empty());
    assert_eq!(fx.repo.comment_count(), 0);
}

#[tokio::test]
async fn test_create_comment_with_unknown_parent_is_400() {
    let fx = Fixture::new().await;
    let uri = format!("/posts/{}/comments", fx.post.id);
    let body = json!({ "message": "orphan", "parentId": CommentId::generate() });
    let (status, _) = send(fx.router(), Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_comment_checks_owner() {
    let fx = Fixture::new().await;
    let mine = seed_comment(&fx, &fx.yasu, None, "mine").await;
    let theirs = seed_comment(&fx, &fx.sally, None, "theirs").await;

    let uri = format!("/posts/{}/comments/{}", fx.post.id, mine);
    let (status, body) = send(fx.router(), Method::PUT, &uri, Some(json!({ "message": "edited" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "edited" }));

    let uri = format!("/posts/{}/comments/{}", fx.post.id, theirs);
    let (status, body) = send(fx.router(), Method::PUT, &uri, Some(json!({ "message": "hijack" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You do not have permission to edit this message");
    assert_eq!(fx.repo.get_comment(theirs).await.unwrap().message, "theirs");
}

#[tokio::test]
async fn test_update_blank_message_is_400() {
    let fx = Fixture::new().await;
    let mine = seed_comment(&fx, &fx.yasu, None, "mine").await;
    let uri = format!("/posts/{}/comments/{}", fx.post.id, mine);
    let (status, body) = send(fx.router(), Method::PUT, &uri, Some(json!({ "message": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message is required");
}

#[tokio::test]
async fn test_delete_comment_cascades_to_replies() {
    let fx = Fixture::new().await;
    let root = seed_comment(&fx, &fx.yasu, None, "root").await;
    let reply = seed_comment(&fx, &fx.sally, Some(root), "reply").await;
    seed_comment(&fx, &fx.yasu, Some(reply), "nested").await;
    fx.repo
        .create_like(Like {
            user_id: fx.sally.id,
            comment_id: reply,
        })
        .await
        .unwrap();

    let uri = format!("/posts/{}/comments/{}", fx.post.id, root);
    let (status, body) = send(fx.router(), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": root.to_string() }));
    assert_eq!(fx.repo.comment_count(), 0);
    assert_eq!(fx.repo.like_count(), 0);
}

#[tokio::test]
async fn test_delete_foreign_comment_is_401() {
    let fx = Fixture::new().await;
    let theirs = seed_comment(&fx, &fx.sally, None, "theirs").await;
    let uri = format!("/posts/{}/comments/{}", fx.post.id, theirs);
    let (status, body) = send(fx.router(), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You do not have permission to delete this message");
    assert!(fx.repo.has_comment(theirs));
}

#[tokio::test]
async fn test_delete_missing_comment_is_404() {
    let fx = Fixture::new().await;
    let uri = format!("/posts/{}/comments/{}", fx.post.id, CommentId::generate());
    let (status, _) = send(fx.router(), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggle_like_round_trip() {
    let fx = Fixture::new().await;
    let theirs = seed_comment(&fx, &fx.sally, None, "like me").await;
    let uri = format!("/posts/{}/comments/{}/toggleLike", fx.post.id, theirs);

    let (status, body) = send(fx.router(), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "addLike": true }));
    assert!(fx.repo.find_like(fx.yasu.id, theirs).await.unwrap().is_some());

    let (_, body) = send(fx.router(), Method::POST, &uri, None).await;
    assert_eq!(body, json!({ "addLike": false }));
    assert_eq!(fx.repo.like_count(), 0);
}

#[tokio::test]
async fn test_toggle_like_on_missing_comment_is_404() {
    let fx = Fixture::new().await;
    let uri = format!("/posts/{}/comments/{}/toggleLike", fx.post.id, CommentId::generate());
    let (status, _) = send(fx.router(), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_disconnected_store() {
    let fx = Fixture::new().await;
    fx.repo.set_healthy(false);
    let (status, body) = send(fx.router(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "disconnected");
}
