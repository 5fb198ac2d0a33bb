//! Service layer for comment threads.
//!
//! These functions sit between the HTTP handlers and the repository traits.
//! They validate input, enforce single-owner checks and shape persistence
//! records into the wire DTOs from [`crate::api`]. Every function works with
//! any repository implementation.

use tracing::{debug, info};

use super::repository::{FullRepository, RepositoryError};
use crate::api::{
    CommentView, DeletedComment, PostDetail, PostSummary, ToggleLikeResponse, UpdatedComment,
    UserRef,
};
use crate::models::{
    Comment, CommentId, CommentRecord, Like, NewComment, PostId, User, UserId,
};

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const EDIT_FORBIDDEN: &str = "You do not have permission to edit this message";
pub const DELETE_FORBIDDEN: &str = "You do not have permission to delete this message";

/// Errors raised by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Client input was rejected before reaching storage.
    #[error("{0}")]
    InvalidInput(String),

    /// The addressed post or comment does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The current user does not own the addressed comment.
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Input for creating a comment or reply.
#[derive(Debug, Clone, Default)]
pub struct CommentDraft {
    pub message: String,
    pub parent_id: Option<CommentId>,
}

/// Check that the backing store is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<bool> {
    Ok(repo.health_check().await?)
}

/// Resolve the configured current user by name.
pub async fn resolve_user<R: FullRepository + ?Sized>(repo: &R, name: &str) -> ServiceResult<User> {
    repo.find_user_by_name(name)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User '{}' not found", name)))
}

/// List every post as `{ id, title }`.
pub async fn list_posts<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<Vec<PostSummary>> {
    let posts = repo.list_posts().await?;
    Ok(posts
        .into_iter()
        .map(|post| PostSummary {
            id: post.id,
            title: post.title,
        })
        .collect())
}

/// Load a post with all of its comments, newest first, as seen by `viewer`.
pub async fn get_post<R: FullRepository + ?Sized>(
    repo: &R,
    post_id: PostId,
    viewer: UserId,
) -> ServiceResult<PostDetail> {
    let post = repo.get_post(post_id).await.map_err(|e| not_found_as(e, "Post not found"))?;
    let records = repo.list_comments_for_post(post_id).await?;

    let ids: Vec<CommentId> = records.iter().map(|r| r.comment.id).collect();
    let liked = repo.liked_comment_ids(viewer, &ids).await?;
    debug!(
        post_id = %post_id,
        comments = records.len(),
        liked = liked.len(),
        "Loaded post"
    );

    let comments = records
        .into_iter()
        .map(|record| {
            let liked_by_me = liked.contains(&record.comment.id);
            to_view(record, liked_by_me)
        })
        .collect();

    Ok(PostDetail {
        id: post.id,
        title: post.title,
        body: post.body,
        comments,
    })
}

/// Create a top-level comment or a reply on a post.
///
/// The message must not be blank, and a parent must be a comment of the same
/// post. New comments start with no likes.
pub async fn create_comment<R: FullRepository + ?Sized>(
    repo: &R,
    post_id: PostId,
    author: UserId,
    draft: CommentDraft,
) -> ServiceResult<CommentView> {
    let message = require_message(&draft.message)?;
    repo.get_post(post_id).await.map_err(|e| not_found_as(e, "Post not found"))?;

    if let Some(parent_id) = draft.parent_id {
        let parent = repo.get_comment(parent_id).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::InvalidInput("Parent comment does not exist".to_string())
            } else {
                e.into()
            }
        })?;
        if parent.post_id != post_id {
            return Err(ServiceError::InvalidInput(
                "Parent comment belongs to another post".to_string(),
            ));
        }
    }

    let record = repo
        .create_comment(&NewComment {
            post_id,
            user_id: author,
            parent_id: draft.parent_id,
            message,
        })
        .await?;
    info!(
        post_id = %post_id,
        comment_id = %record.comment.id,
        reply = draft.parent_id.is_some(),
        "Comment created"
    );

    Ok(to_view(
        CommentRecord {
            like_count: 0,
            ..record
        },
        false,
    ))
}

/// Replace the message of a comment owned by `actor`.
pub async fn update_comment<R: FullRepository + ?Sized>(
    repo: &R,
    post_id: PostId,
    comment_id: CommentId,
    actor: UserId,
    message: &str,
) -> ServiceResult<UpdatedComment> {
    let message = require_message(message)?;
    let comment = load_comment_of_post(repo, post_id, comment_id).await?;
    if comment.user_id != actor {
        return Err(ServiceError::Unauthorized(EDIT_FORBIDDEN.to_string()));
    }

    let updated = repo.update_comment_message(comment_id, &message).await?;
    info!(comment_id = %comment_id, "Comment updated");
    Ok(UpdatedComment {
        message: updated.message,
    })
}

/// Delete a comment owned by `actor`, together with its replies.
pub async fn delete_comment<R: FullRepository + ?Sized>(
    repo: &R,
    post_id: PostId,
    comment_id: CommentId,
    actor: UserId,
) -> ServiceResult<DeletedComment> {
    let comment = load_comment_of_post(repo, post_id, comment_id).await?;
    if comment.user_id != actor {
        return Err(ServiceError::Unauthorized(DELETE_FORBIDDEN.to_string()));
    }

    let removed = repo.delete_comment(comment_id).await?;
    info!(comment_id = %comment_id, removed = removed.len(), "Comment deleted");
    Ok(DeletedComment { id: comment_id })
}

/// Like the comment if `user` has not liked it yet, otherwise remove the like.
pub async fn toggle_like<R: FullRepository + ?Sized>(
    repo: &R,
    post_id: PostId,
    comment_id: CommentId,
    user: UserId,
) -> ServiceResult<ToggleLikeResponse> {
    load_comment_of_post(repo, post_id, comment_id).await?;

    let add_like = match repo.find_like(user, comment_id).await? {
        None => {
            let like = Like {
                user_id: user,
                comment_id,
            };
            match repo.create_like(like).await {
                Ok(()) => {}
                // A concurrent toggle inserted it between the read and the write.
                Err(RepositoryError::Conflict { .. }) => {
                    debug!(comment_id = %comment_id, "Like already present");
                }
                Err(e) => return Err(e.into()),
            }
            true
        }
        Some(_) => {
            repo.delete_like(user, comment_id).await?;
            false
        }
    };
    debug!(comment_id = %comment_id, add_like, "Like toggled");
    Ok(ToggleLikeResponse { add_like })
}

/// Summary of what [`seed_demo_data`] inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_created: usize,
    pub posts_created: usize,
}

pub const DEMO_USERS: [&str; 2] = ["Yasu", "Sally"];

const DEMO_POSTS: [(&str, &str); 2] = [
    (
        "Post 1",
        "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed vitae libero \
         at nunc pretium facilisis. Curabitur sit amet luctus erat.",
    ),
    (
        "Post 2",
        "Donec eget sem non lacus tincidunt vehicula. Integer at velit vitae nisl \
         ultrices pharetra in non tortor.",
    ),
];

/// Insert the demo users and posts when they are missing. Safe to call on
/// every start.
pub async fn seed_demo_data<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for name in DEMO_USERS {
        if repo.find_user_by_name(name).await?.is_none() {
            repo.create_user(name).await?;
            summary.users_created += 1;
        }
    }

    if repo.list_posts().await?.is_empty() {
        for (title, body) in DEMO_POSTS {
            repo.create_post(title, body).await?;
            summary.posts_created += 1;
        }
    }

    if summary != SeedSummary::default() {
        info!(
            users = summary.users_created,
            posts = summary.posts_created,
            "Seeded demo data"
        );
    }
    Ok(summary)
}

fn require_message(message: &str) -> ServiceResult<String> {
    if message.trim().is_empty() {
        return Err(ServiceError::InvalidInput(MESSAGE_REQUIRED.to_string()));
    }
    Ok(message.to_string())
}

/// Fetch a comment and check it hangs off `post_id`.
async fn load_comment_of_post<R: FullRepository + ?Sized>(
    repo: &R,
    post_id: PostId,
    comment_id: CommentId,
) -> ServiceResult<Comment> {
    let comment = repo
        .get_comment(comment_id)
        .await
        .map_err(|e| not_found_as(e, "Comment not found"))?;
    if comment.post_id != post_id {
        return Err(ServiceError::NotFound("Comment not found".to_string()));
    }
    Ok(comment)
}

fn not_found_as(err: RepositoryError, message: &str) -> ServiceError {
    if err.is_not_found() {
        ServiceError::NotFound(message.to_string())
    } else {
        ServiceError::Repository(err)
    }
}

fn to_view(record: CommentRecord, liked_by_me: bool) -> CommentView {
    let CommentRecord {
        comment,
        author,
        like_count,
    } = record;

    CommentView {
        id: comment.id,
        message: comment.message,
        parent_id: comment.parent_id,
        created_at: comment.created_at,
        user: UserRef {
            id: author.id,
            name: author.name,
        },
        like_count,
        liked_by_me,
    }
}
