//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{
    CommentView, CreateCommentRequest, DeletedComment, HealthResponse, PostDetail, PostSummary,
    ToggleLikeResponse, UpdateCommentRequest, UpdatedComment,
};
use super::error::AppError;
use super::extract::{ApiJson, ApiPath};
use super::identity::CurrentUser;
use super::state::AppState;
use crate::api::{CommentId, PostId};
use crate::db::services::{self as db_services, CommentDraft};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Posts
// =============================================================================

/// GET /posts
pub async fn list_posts(State(state): State<AppState>) -> HandlerResult<Vec<PostSummary>> {
    let posts = db_services::list_posts(state.repository.as_ref()).await?;
    Ok(Json(posts))
}

/// GET /posts/{id}
///
/// Returns the post with every comment, newest first. `likedByMe` is computed
/// for the current user.
pub async fn get_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(post_id): ApiPath<PostId>,
) -> HandlerResult<PostDetail> {
    let post = db_services::get_post(state.repository.as_ref(), post_id, user).await?;
    Ok(Json(post))
}

// =============================================================================
// Comments
// =============================================================================

/// POST /posts/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), AppError> {
    let draft = CommentDraft {
        message: request.message,
        parent_id: request.parent_id,
    };
    let comment =
        db_services::create_comment(state.repository.as_ref(), post_id, user, draft).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /posts/{postId}/comments/{commentId}
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath((post_id, comment_id)): ApiPath<(PostId, CommentId)>,
    ApiJson(request): ApiJson<UpdateCommentRequest>,
) -> HandlerResult<UpdatedComment> {
    let updated = db_services::update_comment(
        state.repository.as_ref(),
        post_id,
        comment_id,
        user,
        &request.message,
    )
    .await?;
    Ok(Json(updated))
}

/// DELETE /posts/{postId}/comments/{commentId}
///
/// Replies of the comment are removed with it.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath((post_id, comment_id)): ApiPath<(PostId, CommentId)>,
) -> HandlerResult<DeletedComment> {
    let deleted =
        db_services::delete_comment(state.repository.as_ref(), post_id, comment_id, user).await?;
    Ok(Json(deleted))
}

/// POST /posts/{postId}/comments/{commentId}/toggleLike
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath((post_id, comment_id)): ApiPath<(PostId, CommentId)>,
) -> HandlerResult<ToggleLikeResponse> {
    let toggled =
        db_services::toggle_like(state.repository.as_ref(), post_id, comment_id, user).await?;
    Ok(Json(toggled))
}
