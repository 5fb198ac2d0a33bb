//! State container for the post being viewed.
//!
//! The server returns comments as a flat list. [`PostState`] keeps that list
//! and a derived index from parent id to replies (key `None` holds the root
//! comments), rebuilt after every change so the tree can be walked without
//! re-grouping. Mutations call the API first and touch local state only when
//! the call succeeded.

use std::collections::{HashMap, HashSet};

use crate::api::{CommentId, CommentView, PostDetail, PostId, UserId};
use crate::client::{ClientResult, CommentsApi};

use super::async_state::AsyncState;

/// Local changes applied to the comment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    SetComments(Vec<CommentView>),
    CreateComment(CommentView),
    UpdateComment { id: CommentId, message: String },
    /// Removes the comment and all of its descendants.
    DeleteComment(CommentId),
    ToggleLike { id: CommentId, add_like: bool },
}

/// Apply `action` to a comment list.
pub fn reduce(mut comments: Vec<CommentView>, action: CommentAction) -> Vec<CommentView> {
    match action {
        CommentAction::SetComments(list) => list,
        CommentAction::CreateComment(comment) => {
            comments.insert(0, comment);
            comments
        }
        CommentAction::UpdateComment { id, message } => {
            if let Some(comment) = comments.iter_mut().find(|c| c.id == id) {
                comment.message = message;
            }
            comments
        }
        CommentAction::DeleteComment(id) => {
            let doomed = descendants_of(&comments, id);
            comments.retain(|c| !doomed.contains(&c.id));
            comments
        }
        CommentAction::ToggleLike { id, add_like } => {
            if let Some(comment) = comments.iter_mut().find(|c| c.id == id) {
                comment.like_count = if add_like {
                    comment.like_count + 1
                } else {
                    (comment.like_count - 1).max(0)
                };
                comment.liked_by_me = add_like;
            }
            comments
        }
    }
}

/// `root` plus every comment transitively replying to it, if `root` is present.
fn descendants_of(comments: &[CommentView], root: CommentId) -> HashSet<CommentId> {
    let mut doomed = HashSet::new();
    if !comments.iter().any(|c| c.id == root) {
        return doomed;
    }
    doomed.insert(root);

    let mut frontier = vec![root];
    while let Some(parent) = frontier.pop() {
        for child in comments.iter().filter(|c| c.parent_id == Some(parent)) {
            if doomed.insert(child.id) {
                frontier.push(child.id);
            }
        }
    }
    doomed
}

/// The post being viewed and its comments.
#[derive(Debug, Clone)]
pub struct PostState {
    post_id: PostId,
    request: AsyncState<PostDetail>,
    current_user: Option<UserId>,
    comments: Vec<CommentView>,
    by_parent: HashMap<Option<CommentId>, Vec<CommentView>>,
}

impl PostState {
    /// Empty state for `post_id`; loading until [`PostState::load`] finishes.
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            request: AsyncState::immediate(),
            current_user: None,
            comments: Vec::new(),
            by_parent: HashMap::new(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn post(&self) -> Option<&PostDetail> {
        self.request.value()
    }

    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.request.error()
    }

    /// User the server identified us as when the post was loaded.
    pub fn current_user(&self) -> Option<UserId> {
        self.current_user
    }

    pub fn comments(&self) -> &[CommentView] {
        &self.comments
    }

    pub fn root_comments(&self) -> &[CommentView] {
        self.replies_of(None)
    }

    pub fn get_replies(&self, parent_id: CommentId) -> &[CommentView] {
        self.replies_of(Some(parent_id))
    }

    fn replies_of(&self, parent_id: Option<CommentId>) -> &[CommentView] {
        self.by_parent
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Apply a local change and rebuild the parent index.
    pub fn dispatch(&mut self, action: CommentAction) {
        let comments = std::mem::take(&mut self.comments);
        self.comments = reduce(comments, action);
        self.reindex();
    }

    fn reindex(&mut self) {
        let mut by_parent: HashMap<Option<CommentId>, Vec<CommentView>> = HashMap::new();
        for comment in &self.comments {
            by_parent
                .entry(comment.parent_id)
                .or_default()
                .push(comment.clone());
        }
        self.by_parent = by_parent;
    }

    /// Fetch the post and replace the comment list with the server's.
    pub async fn load(&mut self, api: &dyn CommentsApi) -> ClientResult<()> {
        let post = self.request.execute(api.get_post(self.post_id)).await?;
        self.current_user = api.current_user_id();
        tracing::debug!(post_id = %self.post_id, comments = post.comments.len(), "Post loaded");
        self.dispatch(CommentAction::SetComments(post.comments));
        Ok(())
    }

    /// Post a new comment, or a reply when `parent_id` is set.
    pub async fn create_comment(
        &mut self,
        api: &dyn CommentsApi,
        parent_id: Option<CommentId>,
        message: &str,
    ) -> ClientResult<CommentView> {
        let comment = api.create_comment(self.post_id, message, parent_id).await?;
        self.dispatch(CommentAction::CreateComment(comment.clone()));
        Ok(comment)
    }

    pub async fn update_comment(
        &mut self,
        api: &dyn CommentsApi,
        id: CommentId,
        message: &str,
    ) -> ClientResult<()> {
        let updated = api.update_comment(self.post_id, id, message).await?;
        self.dispatch(CommentAction::UpdateComment {
            id,
            message: updated.message,
        });
        Ok(())
    }

    pub async fn delete_comment(&mut self, api: &dyn CommentsApi, id: CommentId) -> ClientResult<()> {
        let deleted = api.delete_comment(self.post_id, id).await?;
        self.dispatch(CommentAction::DeleteComment(deleted.id));
        Ok(())
    }

    /// Like or unlike a comment. Returns `true` when a like was added.
    pub async fn toggle_comment_like(
        &mut self,
        api: &dyn CommentsApi,
        id: CommentId,
    ) -> ClientResult<bool> {
        let toggled = api.toggle_comment_like(self.post_id, id).await?;
        self.dispatch(CommentAction::ToggleLike {
            id,
            add_like: toggled.add_like,
        });
        Ok(toggled.add_like)
    }
}
