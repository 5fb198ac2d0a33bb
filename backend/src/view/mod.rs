//! Plain-text views of a post, its comment tree and comment forms.

pub mod form;
pub mod render;

pub use form::{render_form, CommentForm, FormTarget};
pub use render::{format_date, render_post, ViewState};
