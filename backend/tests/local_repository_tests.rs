use nested_comments::db::repository::{
    CommentRepository, LikeRepository, PostRepository, RepositoryError, UserRepository,
};
use nested_comments::db::LocalRepository;
use nested_comments::models::{CommentId, Like, NewComment, PostId, UserId};

fn new_comment(post_id: PostId, user_id: UserId, parent_id: Option<CommentId>) -> NewComment {
    NewComment {
        post_id,
        user_id,
        parent_id,
        message: "msg".to_string(),
    }
}

#[tokio::test]
async fn test_posts_keep_insertion_order() {
    let repo = LocalRepository::new();
    for title in ["Post 1", "Post 2", "Post 3"] {
        repo.create_post(title, "body").await.unwrap();
    }
    let titles: Vec<_> = repo
        .list_posts()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["Post 1", "Post 2", "Post 3"]);
}

#[tokio::test]
async fn test_blank_user_name_is_rejected() {
    let repo = LocalRepository::new();
    for name in ["", "   "] {
        let err = repo.create_user(name).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert!(!err.is_retryable());
    }
    assert!(repo.find_user_by_name("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_missing_post_is_not_found() {
    let repo = LocalRepository::new();
    let err = repo.get_post(PostId::generate()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_comments_are_scoped_to_their_post() {
    let repo = LocalRepository::new();
    let user = repo.create_user("Yasu").await.unwrap();
    let first = repo.create_post("Post 1", "a").await.unwrap();
    let second = repo.create_post("Post 2", "b").await.unwrap();

    repo.create_comment(&new_comment(first.id, user.id, None))
        .await
        .unwrap();
    repo.create_comment(&new_comment(second.id, user.id, None))
        .await
        .unwrap();

    assert_eq!(repo.list_comments_for_post(first.id).await.unwrap().len(), 1);
    assert_eq!(repo.list_comments_for_post(second.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_message_touches_updated_at() {
    let repo = LocalRepository::new();
    let user = repo.create_user("Yasu").await.unwrap();
    let post = repo.create_post("Post 1", "a").await.unwrap();
    let created = repo
        .create_comment(&new_comment(post.id, user.id, None))
        .await
        .unwrap()
        .comment;

    let updated = repo
        .update_comment_message(created.id, "changed")
        .await
        .unwrap();
    assert_eq!(updated.message, "changed");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_liked_comment_ids_filters_by_user() {
    let repo = LocalRepository::new();
    let yasu = repo.create_user("Yasu").await.unwrap();
    let sally = repo.create_user("Sally").await.unwrap();
    let post = repo.create_post("Post 1", "a").await.unwrap();
    let a = repo
        .create_comment(&new_comment(post.id, yasu.id, None))
        .await
        .unwrap()
        .comment
        .id;
    let b = repo
        .create_comment(&new_comment(post.id, yasu.id, Some(a)))
        .await
        .unwrap()
        .comment
        .id;

    repo.create_like(Like {
        user_id: sally.id,
        comment_id: b,
    })
    .await
    .unwrap();

    let liked = repo.liked_comment_ids(sally.id, &[a, b]).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert!(liked.contains(&b));
    assert!(repo.liked_comment_ids(yasu.id, &[a, b]).await.unwrap().is_empty());

    let records = repo.list_comments_for_post(post.id).await.unwrap();
    let counts: Vec<_> = records.iter().map(|r| (r.comment.id, r.like_count)).collect();
    assert_eq!(counts, vec![(b, 1), (a, 0)]);
}

#[tokio::test]
async fn test_like_on_missing_comment_is_not_found() {
    let repo = LocalRepository::new();
    let user = repo.create_user("Yasu").await.unwrap();
    let err = repo
        .create_like(Like {
            user_id: user.id,
            comment_id: CommentId::generate(),
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_clear_keeps_health_flag() {
    let repo = LocalRepository::new();
    repo.create_user("Yasu").await.unwrap();
    repo.set_healthy(false);
    repo.clear();

    assert!(!repo.health_check().await.unwrap());
    let err = repo.list_posts().await.unwrap_err();
    assert!(err.is_retryable());

    repo.set_healthy(true);
    assert!(repo.find_user_by_name("Yasu").await.unwrap().is_none());
}
