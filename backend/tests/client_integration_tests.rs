mod support;

use nested_comments::client::{ApiClient, ClientError, CommentsApi};
use nested_comments::db::repository::CommentRepository;
use nested_comments::models::{NewComment, PostId};
use nested_comments::state::PostState;
use nested_comments::view::{render_post, CommentForm, FormTarget, ViewState};
use support::Fixture;

#[tokio::test]
async fn test_user_cookie_round_trips() {
    let fx = Fixture::new().await;
    let client = ApiClient::new(&fx.spawn_server().await).unwrap();
    assert!(client.current_user_id().is_none());

    let posts = client.get_posts().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(client.current_user_id(), Some(fx.yasu.id));
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let fx = Fixture::new().await;
    let client = ApiClient::new(&fx.spawn_server().await).unwrap();

    let err = client
        .create_comment(fx.post.id, "   ", None)
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Message is required");
    assert_eq!(err.status(), Some(400));

    let err = client.get_post(PostId::generate()).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_post_state_against_live_server() {
    let fx = Fixture::new().await;
    let foreign = fx
        .repo
        .create_comment(&NewComment {
            post_id: fx.post.id,
            user_id: fx.sally.id,
            parent_id: None,
            message: "from Sally".to_string(),
        })
        .await
        .unwrap()
        .comment
        .id;
    let client = ApiClient::new(&fx.spawn_server().await).unwrap();

    let mut state = PostState::new(fx.post.id);
    state.load(&client).await.unwrap();
    assert_eq!(state.current_user(), Some(fx.yasu.id));
    assert_eq!(state.root_comments().len(), 1);

    let mut form = CommentForm::with_initial(FormTarget::Reply(foreign), "hello Sally");
    form.submit(&mut state, &client).await.unwrap();
    let reply = state.get_replies(foreign)[0].clone();
    assert_eq!(reply.user.id, fx.yasu.id);

    let mut edit = CommentForm::with_initial(FormTarget::Edit(foreign), "rewritten");
    let err = edit.submit(&mut state, &client).await.unwrap_err();
    assert_eq!(err, "You do not have permission to edit this message");
    assert_eq!(state.root_comments()[0].message, "from Sally");

    assert!(state.toggle_comment_like(&client, foreign).await.unwrap());
    assert_eq!(state.root_comments()[0].like_count, 1);
    assert!(state.root_comments()[0].liked_by_me);

    let out = render_post(&state, &ViewState::new());
    assert!(out.contains("Likes: 1 (liked) [Reply]\n"));
    assert!(out.contains("  hello Sally\n  Likes: 0 [Reply] [Edit] [Delete]\n"));

    state.delete_comment(&client, reply.id).await.unwrap();
    assert!(state.get_replies(foreign).is_empty());

    // Local state matches a fresh load
    let mut fresh = PostState::new(fx.post.id);
    fresh.load(&client).await.unwrap();
    assert_eq!(fresh.comments(), state.comments());
}
