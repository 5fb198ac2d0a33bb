//! Data Transfer Objects for the HTTP API.
//!
//! Comment and post DTOs are shared with the client and live in
//! [`crate::api`]; they are re-exported here for handler signatures.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    CommentView, CreateCommentRequest, DeletedComment, PostDetail, PostSummary,
    ToggleLikeResponse, UpdateCommentRequest, UpdatedComment,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Database connectivity
    pub database: String,
}
