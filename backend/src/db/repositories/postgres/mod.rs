//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use uuid::Uuid;

use crate::db::repository::{
    CommentRepository, ErrorContext, LikeRepository, PostRepository, RepositoryError,
    RepositoryResult, UserRepository,
};
use crate::models::{
    Comment, CommentId, CommentRecord, Like, NewComment, Post, PostId, User, UserId,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables (see module docs).
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

#[derive(Debug, Default)]
struct QueryCounters {
    total: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    counters: Arc<QueryCounters>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// Blocks while the pool connects; call from a blocking context.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }
        tracing::info!(max_pool_size = config.max_pool_size, "Postgres repository ready");

        Ok(Self {
            pool,
            config,
            counters: Arc::new(QueryCounters::default()),
        })
    }

    /// Run `f` on a pooled connection inside the blocking pool, retrying
    /// retryable failures with exponential backoff.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let mut retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let counters = Arc::clone(&self.counters);

        task::spawn_blocking(move || {
            let mut attempt = 0;
            loop {
                counters.total.fetch_add(1, Ordering::Relaxed);
                let result = pool
                    .get()
                    .map_err(|e| {
                        RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1)),
                        )
                    })
                    .and_then(|mut conn| f(&mut conn));

                match result {
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        attempt += 1;
                        counters.retried.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(operation, attempt, error = %e, "Retrying database operation");
                        std::thread::sleep(retry_delay);
                        retry_delay *= 2;
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                    Ok(value) => return Ok(value),
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            max_size: self.config.max_pool_size,
            total_queries: self.counters.total.load(Ordering::Relaxed),
            failed_queries: self.counters.failed.load(Ordering::Relaxed),
            retried_operations: self.counters.retried.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn not_found(entity: &str, id: Uuid, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity.to_lowercase())
            .with_entity_id(id),
    )
}

/// Attach authors and like counts to comment rows, preserving row order.
fn load_records(
    conn: &mut PgConnection,
    rows: Vec<(CommentRow, UserRow)>,
) -> RepositoryResult<Vec<CommentRecord>> {
    let ids: Vec<Uuid> = rows.iter().map(|(c, _)| c.id).collect();
    let counts: HashMap<Uuid, i64> = if ids.is_empty() {
        HashMap::new()
    } else {
        likes::table
            .filter(likes::comment_id.eq_any(&ids))
            .group_by(likes::comment_id)
            .select((likes::comment_id, count_star()))
            .load::<(Uuid, i64)>(conn)
            .map_err(map_diesel_error)?
            .into_iter()
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|(comment, author)| {
            let like_count = counts.get(&comment.id).copied().unwrap_or(0);
            CommentRecord {
                comment: comment.into(),
                author: author.into(),
                like_count,
            }
        })
        .collect())
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, name: &str) -> RepositoryResult<User> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation("User name must not be blank"));
        }
        let name = name.to_string();
        self.with_conn("create_user", move |conn| {
            diesel::insert_into(users::table)
                .values(&NewUserRow {
                    id: Uuid::new_v4(),
                    name: &name,
                })
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map(User::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_user_by_name(&self, name: &str) -> RepositoryResult<Option<User>> {
        let name = name.to_string();
        self.with_conn("find_user_by_name", move |conn| {
            users::table
                .filter(users::name.eq(&name))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let healthy = self
            .with_conn("health_check", |conn| {
                sql_query("SELECT 1")
                    .execute(conn)
                    .map(|_| true)
                    .map_err(map_diesel_error)
            })
            .await?;

        let stats = self.get_pool_stats();
        tracing::debug!(
            in_use = stats.connections_in_use,
            idle = stats.idle_connections,
            max_size = stats.max_size,
            total_queries = stats.total_queries,
            failed_queries = stats.failed_queries,
            retried = stats.retried_operations,
            "Postgres pool stats"
        );
        Ok(healthy)
    }

    async fn create_post(&self, title: &str, body: &str) -> RepositoryResult<Post> {
        let row = NewPostRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            body: body.to_string(),
        };
        self.with_conn("create_post", move |conn| {
            diesel::insert_into(posts::table)
                .values(&row)
                .returning(PostRow::as_returning())
                .get_result(conn)
                .map(Post::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_posts(&self) -> RepositoryResult<Vec<Post>> {
        self.with_conn("list_posts", |conn| {
            posts::table
                .order(posts::created_at.asc())
                .select(PostRow::as_select())
                .load(conn)
                .map(|rows| rows.into_iter().map(Post::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_post(&self, post_id: PostId) -> RepositoryResult<Post> {
        self.with_conn("get_post", move |conn| {
            posts::table
                .find(post_id.0)
                .select(PostRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Post::from)
                .ok_or_else(|| not_found("Post", post_id.0, "get_post"))
        })
        .await
    }
}

#[async_trait]
impl CommentRepository for PostgresRepository {
    async fn create_comment(&self, comment: &NewComment) -> RepositoryResult<CommentRecord> {
        let row = NewCommentRow {
            id: Uuid::new_v4(),
            message: comment.message.clone(),
            user_id: comment.user_id.0,
            post_id: comment.post_id.0,
            parent_id: comment.parent_id.map(|p| p.0),
        };
        self.with_conn("create_comment", move |conn| {
            conn.transaction(|tx| {
                let inserted: CommentRow = diesel::insert_into(comments::table)
                    .values(&row)
                    .returning(CommentRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                let author: UserRow = users::table
                    .find(inserted.user_id)
                    .select(UserRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                Ok(CommentRecord {
                    comment: inserted.into(),
                    author: author.into(),
                    like_count: 0,
                })
            })
        })
        .await
    }

    async fn get_comment(&self, comment_id: CommentId) -> RepositoryResult<Comment> {
        self.with_conn("get_comment", move |conn| {
            comments::table
                .find(comment_id.0)
                .select(CommentRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Comment::from)
                .ok_or_else(|| not_found("Comment", comment_id.0, "get_comment"))
        })
        .await
    }

    async fn list_comments_for_post(
        &self,
        post_id: PostId,
    ) -> RepositoryResult<Vec<CommentRecord>> {
        self.with_conn("list_comments_for_post", move |conn| {
            let rows: Vec<(CommentRow, UserRow)> = comments::table
                .inner_join(users::table)
                .filter(comments::post_id.eq(post_id.0))
                .order(comments::created_at.desc())
                .select((CommentRow::as_select(), UserRow::as_select()))
                .load(conn)
                .map_err(map_diesel_error)?;
            load_records(conn, rows)
        })
        .await
    }

    async fn update_comment_message(
        &self,
        comment_id: CommentId,
        message: &str,
    ) -> RepositoryResult<Comment> {
        let message = message.to_string();
        self.with_conn("update_comment_message", move |conn| {
            diesel::update(comments::table.find(comment_id.0))
                .set((
                    comments::message.eq(&message),
                    comments::updated_at.eq(Utc::now()),
                ))
                .returning(CommentRow::as_returning())
                .get_result(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Comment::from)
                .ok_or_else(|| not_found("Comment", comment_id.0, "update_comment_message"))
        })
        .await
    }

    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<Vec<CommentId>> {
        self.with_conn("delete_comment", move |conn| {
            conn.transaction(|tx| {
                let subtree: Vec<SubtreeIdRow> = sql_query(
                    "WITH RECURSIVE subtree AS ( \
                         SELECT id, 0 AS depth FROM comments WHERE id = $1 \
                         UNION ALL \
                         SELECT c.id, s.depth + 1 FROM comments c \
                         JOIN subtree s ON c.parent_id = s.id \
                     ) SELECT id FROM subtree ORDER BY depth",
                )
                .bind::<diesel::sql_types::Uuid, _>(comment_id.0)
                .load(tx)
                .map_err(map_diesel_error)?;

                if subtree.is_empty() {
                    return Err(not_found("Comment", comment_id.0, "delete_comment"));
                }

                // Replies and likes go with the root through ON DELETE CASCADE
                diesel::delete(comments::table.find(comment_id.0))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                Ok(subtree.into_iter().map(|row| CommentId(row.id)).collect())
            })
        })
        .await
    }
}

#[async_trait]
impl LikeRepository for PostgresRepository {
    async fn find_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<Option<Like>> {
        self.with_conn("find_like", move |conn| {
            likes::table
                .find((user_id.0, comment_id.0))
                .select(LikeRow::as_select())
                .first(conn)
                .optional()
                .map(|row| {
                    row.map(|r| Like {
                        user_id: UserId(r.user_id),
                        comment_id: CommentId(r.comment_id),
                    })
                })
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_like(&self, like: Like) -> RepositoryResult<()> {
        let row = LikeRow {
            user_id: like.user_id.0,
            comment_id: like.comment_id.0,
        };
        self.with_conn("create_like", move |conn| {
            diesel::insert_into(likes::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_like(&self, user_id: UserId, comment_id: CommentId) -> RepositoryResult<bool> {
        self.with_conn("delete_like", move |conn| {
            diesel::delete(likes::table.find((user_id.0, comment_id.0)))
                .execute(conn)
                .map(|deleted| deleted > 0)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn liked_comment_ids(
        &self,
        user_id: UserId,
        comment_ids: &[CommentId],
    ) -> RepositoryResult<HashSet<CommentId>> {
        if comment_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<Uuid> = comment_ids.iter().map(|id| id.0).collect();
        self.with_conn("liked_comment_ids", move |conn| {
            likes::table
                .filter(likes::user_id.eq(user_id.0))
                .filter(likes::comment_id.eq_any(&ids))
                .select(likes::comment_id)
                .load::<Uuid>(conn)
                .map(|rows| rows.into_iter().map(CommentId).collect())
                .map_err(map_diesel_error)
        })
        .await
    }
}
