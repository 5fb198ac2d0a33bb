//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::models::UserId;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// User every request acts as
    pub current_user: UserId,
    /// Origin allowed by CORS with credentials; permissive when `None`
    pub client_url: Option<String>,
}

impl AppState {
    /// Create a new application state with the given repository and user.
    pub fn new(repository: Arc<dyn FullRepository>, current_user: UserId) -> Self {
        Self {
            repository,
            current_user,
            client_url: None,
        }
    }

    pub fn with_client_url(mut self, client_url: Option<String>) -> Self {
        self.client_url = client_url;
        self
    }
}
