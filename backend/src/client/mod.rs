//! HTTP client for the comments REST API.
//!
//! [`ApiClient`] keeps a cookie jar so the `userId` cookie assigned by the
//! server round-trips on every call. Failures collapse into [`ClientError`],
//! whose message is the server's `message` field when one was sent and the
//! literal `"Error"` otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::{
    CommentId, CommentView, CreateCommentRequest, DeletedComment, PostDetail, PostId,
    PostSummary, ToggleLikeResponse, UpdateCommentRequest, UpdatedComment, UserId,
};

/// Message used when the server gave no usable error message.
pub const GENERIC_ERROR: &str = "Error";

/// Errors returned by the transport client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("Error")]
    Transport { detail: String },
}

impl ClientError {
    /// Message suitable for display next to the failed action.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Api { message, .. } => message,
            ClientError::Transport { .. } => GENERIC_ERROR,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport { .. } => None,
        }
    }

    fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::Transport {
            detail: err.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Operations the post state container needs from the server.
#[async_trait]
pub trait CommentsApi: Send + Sync {
    /// Id of the user the server treats us as, once known.
    fn current_user_id(&self) -> Option<UserId>;

    async fn get_posts(&self) -> ClientResult<Vec<PostSummary>>;

    async fn get_post(&self, post_id: PostId) -> ClientResult<PostDetail>;

    async fn create_comment(
        &self,
        post_id: PostId,
        message: &str,
        parent_id: Option<CommentId>,
    ) -> ClientResult<CommentView>;

    async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        message: &str,
    ) -> ClientResult<UpdatedComment>;

    async fn delete_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
    ) -> ClientResult<DeletedComment>;

    async fn toggle_comment_like(
        &self,
        post_id: PostId,
        comment_id: CommentId,
    ) -> ClientResult<ToggleLikeResponse>;
}

/// Client for the comments REST API.
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(ClientError::transport)?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(ClientError::transport)?;
        Ok(Self {
            base_url,
            http,
            jar,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a request and decode the JSON body of a successful response.
    pub async fn make_request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(ClientError::transport)?;
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(ClientError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            tracing::debug!(status = status.as_u16(), %message, "Request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(ClientError::transport)
    }
}

#[async_trait]
impl CommentsApi for ApiClient {
    fn current_user_id(&self) -> Option<UserId> {
        let cookies = self.jar.cookies(&self.base_url)?;
        let raw = cookies.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == "userId")
            .and_then(|(_, value)| value.parse().ok())
    }

    async fn get_posts(&self) -> ClientResult<Vec<PostSummary>> {
        self.make_request(Method::GET, "posts", None::<&()>).await
    }

    async fn get_post(&self, post_id: PostId) -> ClientResult<PostDetail> {
        self.make_request(Method::GET, &format!("posts/{}", post_id), None::<&()>)
            .await
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        message: &str,
        parent_id: Option<CommentId>,
    ) -> ClientResult<CommentView> {
        let body = CreateCommentRequest {
            message: message.to_string(),
            parent_id,
        };
        self.make_request(
            Method::POST,
            &format!("posts/{}/comments", post_id),
            Some(&body),
        )
        .await
    }

    async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        message: &str,
    ) -> ClientResult<UpdatedComment> {
        let body = UpdateCommentRequest {
            message: message.to_string(),
        };
        self.make_request(
            Method::PUT,
            &format!("posts/{}/comments/{}", post_id, comment_id),
            Some(&body),
        )
        .await
    }

    async fn delete_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
    ) -> ClientResult<DeletedComment> {
        self.make_request(
            Method::DELETE,
            &format!("posts/{}/comments/{}", post_id, comment_id),
            None::<&()>,
        )
        .await
    }

    async fn toggle_comment_like(
        &self,
        post_id: PostId,
        comment_id: CommentId,
    ) -> ClientResult<ToggleLikeResponse> {
        self.make_request(
            Method::POST,
            &format!("posts/{}/comments/{}/toggleLike", post_id, comment_id),
            None::<&()>,
        )
        .await
    }
}
