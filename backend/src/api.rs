//! Public API surface shared by the server and the client.
//!
//! All types serialize with camelCase field names, matching what the
//! REST endpoints emit and accept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use crate::models::{CommentId, PostId, UserId};

/// Entry of the post listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
}

/// A post together with every comment on it, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub comments: Vec<CommentView>,
}

/// Author reference embedded in each comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
}

/// A comment as seen by the requesting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub message: String,
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
    pub like_count: i64,
    pub liked_by_me: bool,
}

/// Request body for `POST /posts/{id}/comments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

/// Request body for `PUT /posts/{postId}/comments/{commentId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
}

/// A `null` message counts as missing.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of a successful edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedComment {
    pub message: String,
}

/// Response of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedComment {
    pub id: CommentId,
}

/// Response of `toggleLike`: `true` when a like was added, `false` when removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub add_like: bool,
}
