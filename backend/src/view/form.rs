//! Comment form: draft text plus the status of its last submission.

use std::fmt::Write;

use crate::api::CommentId;
use crate::client::CommentsApi;
use crate::db::services::MESSAGE_REQUIRED;
use crate::state::{ActionStatus, PostState};

/// What submitting the form does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    /// Top-level comment on the post
    NewComment,
    Reply(CommentId),
    Edit(CommentId),
}

#[derive(Debug, Clone)]
pub struct CommentForm {
    pub target: FormTarget,
    pub draft: String,
    pub status: ActionStatus,
}

impl CommentForm {
    pub fn new(target: FormTarget) -> Self {
        Self {
            target,
            draft: String::new(),
            status: ActionStatus::default(),
        }
    }

    /// Form pre-filled with `initial`, as used when editing.
    pub fn with_initial(target: FormTarget, initial: impl Into<String>) -> Self {
        Self {
            draft: initial.into(),
            ..Self::new(target)
        }
    }

    /// Submit the draft through the post state container.
    ///
    /// Blank drafts are rejected without calling the server. The draft is
    /// cleared once the server accepted it; on failure it is kept and the
    /// error message is returned and stored in `status`.
    pub async fn submit(
        &mut self,
        state: &mut PostState,
        api: &dyn CommentsApi,
    ) -> Result<(), String> {
        if self.draft.trim().is_empty() {
            self.status.error = Some(MESSAGE_REQUIRED.to_string());
            return Err(MESSAGE_REQUIRED.to_string());
        }

        let message = self.draft.as_str();
        let result = match self.target {
            FormTarget::NewComment => self
                .status
                .track(async { state.create_comment(api, None, message).await.map(drop) })
                .await,
            FormTarget::Reply(parent) => self
                .status
                .track(async {
                    state
                        .create_comment(api, Some(parent), message)
                        .await
                        .map(drop)
                })
                .await,
            FormTarget::Edit(id) => self
                .status
                .track(state.update_comment(api, id, message))
                .await,
        };

        match result {
            Ok(()) => {
                self.draft.clear();
                Ok(())
            }
            Err(e) => Err(e.message().to_string()),
        }
    }
}

/// Render the form as a text box with its button and error line.
pub fn render_form(form: &CommentForm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "> {}", form.draft);
    let button = if form.status.loading { "Loading..." } else { "Post" };
    let _ = writeln!(out, "[{}]", button);
    if let Some(error) = &form.status.error {
        let _ = writeln!(out, "! {}", error);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::post_state::tests::FakeApi;

    async fn loaded() -> (FakeApi, PostState) {
        let api = FakeApi::new(Vec::new());
        let mut state = PostState::new(api.post.id);
        state.load(&api).await.unwrap();
        (api, state)
    }

    #[tokio::test]
    async fn test_blank_draft_is_rejected_locally() {
        let (api, mut state) = loaded().await;
        let mut form = CommentForm::new(FormTarget::NewComment);
        form.draft = "   ".to_string();

        assert_eq!(form.submit(&mut state, &api).await, Err(MESSAGE_REQUIRED.to_string()));
        assert!(state.comments().is_empty());
        assert!(render_form(&form).contains("! Message is required"));
    }

    #[tokio::test]
    async fn test_successful_reply_clears_draft() {
        let (api, mut state) = loaded().await;
        let mut root = CommentForm::with_initial(FormTarget::NewComment, "root");
        root.submit(&mut state, &api).await.unwrap();
        assert!(root.draft.is_empty());
        let root_id = state.root_comments()[0].id;

        let mut reply = CommentForm::with_initial(FormTarget::Reply(root_id), "child");
        reply.submit(&mut state, &api).await.unwrap();
        assert_eq!(state.get_replies(root_id)[0].message, "child");
        assert!(reply.status.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_draft() {
        let (api, mut state) = loaded().await;
        let mut root = CommentForm::with_initial(FormTarget::NewComment, "root");
        root.submit(&mut state, &api).await.unwrap();
        let id = state.root_comments()[0].id;

        let mut edit = CommentForm::with_initial(FormTarget::Edit(id), "changed");
        api.fail_next("You do not have permission to edit this message");
        let err = edit.submit(&mut state, &api).await.unwrap_err();
        assert_eq!(err, "You do not have permission to edit this message");
        assert_eq!(edit.draft, "changed");
        assert_eq!(state.root_comments()[0].message, "root");
        assert_eq!(render_form(&edit), "> changed\n[Post]\n! You do not have permission to edit this message\n");
    }
}
