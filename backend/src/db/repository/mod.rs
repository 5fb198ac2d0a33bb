//! Repository traits for abstracting persistence.
//!
//! The traits are split per aggregate so backends can be read piecewise;
//! [`FullRepository`] bundles them for the service layer and the HTTP state.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync` so they can be shared behind an
//! `Arc` across request handlers.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::models::{
    Comment, CommentId, CommentRecord, Like, NewComment, Post, PostId, User, UserId,
};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// User lookups and creation.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Names are unique; a duplicate yields `RepositoryError::Conflict`
    /// and a blank name yields `RepositoryError::ValidationError`.
    async fn create_user(&self, name: &str) -> RepositoryResult<User>;

    /// Find a user by exact name.
    async fn find_user_by_name(&self, name: &str) -> RepositoryResult<Option<User>>;
}

/// Post storage.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    async fn health_check(&self) -> RepositoryResult<bool>;

    async fn create_post(&self, title: &str, body: &str) -> RepositoryResult<Post>;

    /// All posts, in insertion order.
    async fn list_posts(&self) -> RepositoryResult<Vec<Post>>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the post doesn't exist
    async fn get_post(&self, post_id: PostId) -> RepositoryResult<Post>;
}

/// Comment storage.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment. Id and timestamps are assigned by the backend.
    async fn create_comment(&self, comment: &NewComment) -> RepositoryResult<CommentRecord>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the comment doesn't exist
    async fn get_comment(&self, comment_id: CommentId) -> RepositoryResult<Comment>;

    /// Every comment of a post with author and like count, newest first.
    async fn list_comments_for_post(&self, post_id: PostId)
        -> RepositoryResult<Vec<CommentRecord>>;

    /// Replace the message of a comment and bump `updated_at`.
    async fn update_comment_message(
        &self,
        comment_id: CommentId,
        message: &str,
    ) -> RepositoryResult<Comment>;

    /// Delete a comment together with all of its replies and their likes.
    ///
    /// # Returns
    /// The ids of every removed comment, the requested one first.
    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<Vec<CommentId>>;
}

/// Like storage. `(user_id, comment_id)` is unique.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<Option<Like>>;

    /// Insert a like. A duplicate yields `RepositoryError::Conflict`.
    async fn create_like(&self, like: Like) -> RepositoryResult<()>;

    /// Remove a like. Returns `false` when there was nothing to remove.
    async fn delete_like(&self, user_id: UserId, comment_id: CommentId) -> RepositoryResult<bool>;

    /// The subset of `comment_ids` liked by `user_id`.
    async fn liked_comment_ids(
        &self,
        user_id: UserId,
        comment_ids: &[CommentId],
    ) -> RepositoryResult<HashSet<CommentId>>;
}

/// Everything the service layer needs from a backend.
pub trait FullRepository:
    UserRepository + PostRepository + CommentRepository + LikeRepository
{
}

impl<T> FullRepository for T where
    T: UserRepository + PostRepository + CommentRepository + LikeRepository
{
}
