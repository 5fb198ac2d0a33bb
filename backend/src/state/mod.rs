//! Client-side state: async operation tracking and the post state container.

pub mod async_state;
pub mod post_state;

pub use async_state::{ActionStatus, AsyncState};
pub use post_state::{CommentAction, PostState};
