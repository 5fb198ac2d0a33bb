//! Persistence records for posts, comments, likes and users.
//!
//! These are the shapes exchanged between the service layer and the
//! repositories. Wire-facing DTOs live in [`crate::api`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[macro_use]
pub mod macros;

define_id_type!(UserId);
define_id_type!(PostId);
define_id_type!(CommentId);

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
}

/// A stored comment. `parent_id` is `None` for top-level comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a comment; the repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub message: String,
}

/// A like. At most one exists per `(user_id, comment_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Like {
    pub user_id: UserId,
    pub comment_id: CommentId,
}

/// A comment joined with its author and the number of likes it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub comment: Comment,
    pub author: User,
    pub like_count: i64,
}
