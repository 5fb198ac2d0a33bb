//! In-memory local repository implementation.
//!
//! All data lives in `HashMap`s behind a single lock, which keeps execution
//! fast, deterministic and isolated for unit tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    Comment, CommentId, CommentRecord, Like, NewComment, Post, PostId, User, UserId,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use nested_comments::db::repositories::LocalRepository;
/// use nested_comments::db::repository::PostRepository;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let repo = LocalRepository::new();
/// repo.create_post("Hello", "First post").await.unwrap();
/// assert_eq!(repo.list_posts().await.unwrap().len(), 1);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct LocalData {
    users: HashMap<UserId, User>,
    posts: HashMap<PostId, Post>,
    post_order: Vec<PostId>,
    comments: HashMap<CommentId, StoredComment>,
    likes: HashSet<Like>,

    // Monotonic insertion counter; breaks ties between equal timestamps
    next_sequence: u64,

    // Connection health
    unhealthy: bool,
}

#[derive(Clone)]
struct StoredComment {
    comment: Comment,
    sequence: u64,
}

impl LocalData {
    fn record_for(&self, stored: &StoredComment) -> RepositoryResult<CommentRecord> {
        let comment = &stored.comment;
        let author = self.users.get(&comment.user_id).cloned().ok_or_else(|| {
            RepositoryError::internal_with_context(
                "Comment author is missing",
                ErrorContext::new("record_for")
                    .with_entity("user")
                    .with_entity_id(comment.user_id),
            )
        })?;
        let like_count = self
            .likes
            .iter()
            .filter(|like| like.comment_id == comment.id)
            .count() as i64;

        Ok(CommentRecord {
            comment: comment.clone(),
            author,
            like_count,
        })
    }

    /// The comment and all of its transitive replies, breadth first.
    fn subtree(&self, root: CommentId) -> Vec<CommentId> {
        let mut ids = vec![root];
        let mut cursor = 0;
        while cursor < ids.len() {
            let parent = ids[cursor];
            let mut children: Vec<&StoredComment> = self
                .comments
                .values()
                .filter(|c| c.comment.parent_id == Some(parent))
                .collect();
            children.sort_by_key(|c| c.sequence);
            ids.extend(children.into_iter().map(|c| c.comment.id));
            cursor += 1;
        }
        ids
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().unhealthy = !healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let unhealthy = data.unhealthy;
        *data = LocalData {
            unhealthy,
            ..Default::default()
        };
    }

    pub fn comment_count(&self) -> usize {
        self.data.read().comments.len()
    }

    pub fn like_count(&self) -> usize {
        self.data.read().likes.len()
    }

    pub fn has_comment(&self, comment_id: CommentId) -> bool {
        self.data.read().comments.contains_key(&comment_id)
    }

    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().unhealthy {
            return Err(RepositoryError::connection_with_context(
                "Local repository marked unhealthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn create_user(&self, name: &str) -> RepositoryResult<User> {
        self.ensure_healthy("create_user")?;
        if name.trim().is_empty() {
            return Err(RepositoryError::validation("User name must not be blank"));
        }
        let mut data = self.data.write();
        if data.users.values().any(|u| u.name == name) {
            return Err(RepositoryError::Conflict {
                message: format!("User '{}' already exists", name),
                context: ErrorContext::new("create_user").with_entity("user"),
            });
        }

        let user = User {
            id: UserId::generate(),
            name: name.to_string(),
        };
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_name(&self, name: &str) -> RepositoryResult<Option<User>> {
        self.ensure_healthy("find_user_by_name")?;
        let data = self.data.read();
        Ok(data.users.values().find(|u| u.name == name).cloned())
    }
}

#[async_trait]
impl PostRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(!self.data.read().unhealthy)
    }

    async fn create_post(&self, title: &str, body: &str) -> RepositoryResult<Post> {
        self.ensure_healthy("create_post")?;
        let mut data = self.data.write();
        let post = Post {
            id: PostId::generate(),
            title: title.to_string(),
            body: body.to_string(),
        };
        data.post_order.push(post.id);
        data.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> RepositoryResult<Vec<Post>> {
        self.ensure_healthy("list_posts")?;
        let data = self.data.read();
        Ok(data
            .post_order
            .iter()
            .filter_map(|id| data.posts.get(id).cloned())
            .collect())
    }

    async fn get_post(&self, post_id: PostId) -> RepositoryResult<Post> {
        self.ensure_healthy("get_post")?;
        let data = self.data.read();
        data.posts.get(&post_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Post {} not found", post_id),
                ErrorContext::new("get_post")
                    .with_entity("post")
                    .with_entity_id(post_id),
            )
        })
    }
}

#[async_trait]
impl CommentRepository for LocalRepository {
    async fn create_comment(&self, new_comment: &NewComment) -> RepositoryResult<CommentRecord> {
        self.ensure_healthy("create_comment")?;
        let mut data = self.data.write();

        let context = ErrorContext::new("create_comment").with_entity("comment");
        if !data.posts.contains_key(&new_comment.post_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Post {} not found", new_comment.post_id),
                context.with_entity_id(new_comment.post_id),
            ));
        }
        if !data.users.contains_key(&new_comment.user_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("User {} not found", new_comment.user_id),
                context.with_entity_id(new_comment.user_id),
            ));
        }
        if let Some(parent_id) = new_comment.parent_id {
            if !data.comments.contains_key(&parent_id) {
                return Err(RepositoryError::not_found_with_context(
                    format!("Parent comment {} not found", parent_id),
                    context.with_entity_id(parent_id),
                ));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: CommentId::generate(),
            post_id: new_comment.post_id,
            user_id: new_comment.user_id,
            parent_id: new_comment.parent_id,
            message: new_comment.message.clone(),
            created_at: now,
            updated_at: now,
        };
        let sequence = data.next_sequence;
        data.next_sequence += 1;

        let stored = StoredComment { comment, sequence };
        let record = data.record_for(&stored)?;
        data.comments.insert(stored.comment.id, stored);
        Ok(record)
    }

    async fn get_comment(&self, comment_id: CommentId) -> RepositoryResult<Comment> {
        self.ensure_healthy("get_comment")?;
        let data = self.data.read();
        data.comments
            .get(&comment_id)
            .map(|stored| stored.comment.clone())
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Comment {} not found", comment_id),
                    ErrorContext::new("get_comment")
                        .with_entity("comment")
                        .with_entity_id(comment_id),
                )
            })
    }

    async fn list_comments_for_post(
        &self,
        post_id: PostId,
    ) -> RepositoryResult<Vec<CommentRecord>> {
        self.ensure_healthy("list_comments_for_post")?;
        let data = self.data.read();

        let mut stored: Vec<&StoredComment> = data
            .comments
            .values()
            .filter(|c| c.comment.post_id == post_id)
            .collect();
        stored.sort_by(|a, b| {
            b.comment
                .created_at
                .cmp(&a.comment.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });

        stored.into_iter().map(|c| data.record_for(c)).collect()
    }

    async fn update_comment_message(
        &self,
        comment_id: CommentId,
        message: &str,
    ) -> RepositoryResult<Comment> {
        self.ensure_healthy("update_comment_message")?;
        let mut data = self.data.write();
        let stored = data.comments.get_mut(&comment_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Comment {} not found", comment_id),
                ErrorContext::new("update_comment_message")
                    .with_entity("comment")
                    .with_entity_id(comment_id),
            )
        })?;

        stored.comment.message = message.to_string();
        stored.comment.updated_at = Utc::now();
        Ok(stored.comment.clone())
    }

    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<Vec<CommentId>> {
        self.ensure_healthy("delete_comment")?;
        let mut data = self.data.write();
        if !data.comments.contains_key(&comment_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Comment {} not found", comment_id),
                ErrorContext::new("delete_comment")
                    .with_entity("comment")
                    .with_entity_id(comment_id),
            ));
        }

        let removed = data.subtree(comment_id);
        let removed_set: HashSet<CommentId> = removed.iter().copied().collect();
        data.comments.retain(|id, _| !removed_set.contains(id));
        data.likes
            .retain(|like| !removed_set.contains(&like.comment_id));
        Ok(removed)
    }
}

#[async_trait]
impl LikeRepository for LocalRepository {
    async fn find_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<Option<Like>> {
        self.ensure_healthy("find_like")?;
        let like = Like {
            user_id,
            comment_id,
        };
        Ok(self.data.read().likes.get(&like).copied())
    }

    async fn create_like(&self, like: Like) -> RepositoryResult<()> {
        self.ensure_healthy("create_like")?;
        let mut data = self.data.write();
        if !data.comments.contains_key(&like.comment_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Comment {} not found", like.comment_id),
                ErrorContext::new("create_like")
                    .with_entity("comment")
                    .with_entity_id(like.comment_id),
            ));
        }
        if !data.likes.insert(like) {
            return Err(RepositoryError::Conflict {
                message: "Like already exists".to_string(),
                context: ErrorContext::new("create_like")
                    .with_entity("like")
                    .with_entity_id(like.comment_id),
            });
        }
        Ok(())
    }

    async fn delete_like(&self, user_id: UserId, comment_id: CommentId) -> RepositoryResult<bool> {
        self.ensure_healthy("delete_like")?;
        let like = Like {
            user_id,
            comment_id,
        };
        Ok(self.data.write().likes.remove(&like))
    }

    async fn liked_comment_ids(
        &self,
        user_id: UserId,
        comment_ids: &[CommentId],
    ) -> RepositoryResult<HashSet<CommentId>> {
        self.ensure_healthy("liked_comment_ids")?;
        let data = self.data.read();
        Ok(comment_ids
            .iter()
            .copied()
            .filter(|comment_id| {
                data.likes.contains(&Like {
                    user_id,
                    comment_id: *comment_id,
                })
            })
            .collect())
    }
}
