#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use nested_comments::db::repository::{FullRepository, PostRepository, UserRepository};
use nested_comments::db::LocalRepository;
use nested_comments::http::{create_router, AppState};
use nested_comments::models::{Post, User};
use tokio::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables afterwards (also on unwind) and serializes access
/// to the process environment, since tests in one binary run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub async fn with_scoped_env<F, Fut, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
{
    let _lock = ENV_LOCK.lock().await;
    let _guard = ScopedEnv::new(changes);
    f().await
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// A local repository with users Yasu (current) and Sally and one post.
pub struct Fixture {
    pub repo: LocalRepository,
    pub yasu: User,
    pub sally: User,
    pub post: Post,
}

impl Fixture {
    pub async fn new() -> Self {
        let repo = LocalRepository::new();
        let yasu = repo.create_user("Yasu").await.expect("create Yasu");
        let sally = repo.create_user("Sally").await.expect("create Sally");
        let post = repo
            .create_post("Post 1", "Lorem ipsum")
            .await
            .expect("create post");
        Self {
            repo,
            yasu,
            sally,
            post,
        }
    }

    /// Router acting as Yasu.
    pub fn router(&self) -> axum::Router {
        let repo = Arc::new(self.repo.clone()) as Arc<dyn FullRepository>;
        create_router(AppState::new(repo, self.yasu.id))
    }

    /// Serve the router on an ephemeral port and return its base URL.
    pub async fn spawn_server(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        format!("http://{}", addr)
    }
}
