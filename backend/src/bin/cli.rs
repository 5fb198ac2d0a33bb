//! Command-line client for the comments server.
//!
//! Drives the transport client, the post state container and the text views:
//!
//! ```bash
//! comments posts
//! comments show <post-id>
//! comments reply <post-id> --parent <comment-id> "Nice post"
//! comments like <post-id> <comment-id>
//! ```

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use nested_comments::api::{CommentId, PostId};
use nested_comments::client::{ApiClient, CommentsApi};
use nested_comments::state::PostState;
use nested_comments::view::{render_form, render_post, CommentForm, FormTarget, ViewState};

/// Read and write threaded comments on blog posts.
#[derive(Parser, Debug)]
#[command(name = "comments", about = "Read and write threaded comments on blog posts")]
struct CliArgs {
    /// Base URL of the comments server
    #[arg(long, env = "COMMENTS_SERVER", default_value = "http://localhost:8080")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all posts
    Posts,
    /// Show a post with its comment tree
    Show {
        post: PostId,
        /// Collapse the replies of these comments
        #[arg(long = "collapse")]
        collapsed: Vec<CommentId>,
    },
    /// Comment on a post, or reply to a comment with --parent
    Reply {
        post: PostId,
        message: String,
        #[arg(long)]
        parent: Option<CommentId>,
    },
    /// Edit one of your comments
    Edit {
        post: PostId,
        comment: CommentId,
        message: String,
    },
    /// Delete one of your comments and its replies
    Delete { post: PostId, comment: CommentId },
    /// Like a comment, or remove your like
    Like { post: PostId, comment: CommentId },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let api = ApiClient::new(&args.server).map_err(|e| anyhow!("invalid server URL: {:?}", e))?;

    match args.command {
        Command::Posts => {
            let posts = api.get_posts().await?;
            for post in posts {
                println!("{}  {}", post.id, post.title);
            }
        }
        Command::Show { post, collapsed } => {
            let state = load(&api, post).await?;
            let mut view = ViewState::new();
            for id in collapsed {
                view.hide_replies(id);
            }
            print!("{}", render_post(&state, &view));
        }
        Command::Reply {
            post,
            message,
            parent,
        } => {
            let target = parent.map_or(FormTarget::NewComment, FormTarget::Reply);
            submit(&api, post, CommentForm::with_initial(target, message)).await?;
        }
        Command::Edit {
            post,
            comment,
            message,
        } => {
            let form = CommentForm::with_initial(FormTarget::Edit(comment), message);
            submit(&api, post, form).await?;
        }
        Command::Delete { post, comment } => {
            let mut state = load(&api, post).await?;
            state.delete_comment(&api, comment).await?;
            print!("{}", render_post(&state, &ViewState::new()));
        }
        Command::Like { post, comment } => {
            let mut state = load(&api, post).await?;
            let added = state.toggle_comment_like(&api, comment).await?;
            println!("{}", if added { "Liked" } else { "Unliked" });
        }
    }

    Ok(())
}

async fn load(api: &ApiClient, post: PostId) -> Result<PostState> {
    let mut state = PostState::new(post);
    state.load(api).await?;
    Ok(state)
}

async fn submit(api: &ApiClient, post: PostId, mut form: CommentForm) -> Result<()> {
    let mut state = load(api, post).await?;
    if let Err(message) = form.submit(&mut state, api).await {
        eprint!("{}", render_form(&form));
        return Err(anyhow!(message));
    }
    print!("{}", render_post(&state, &ViewState::new()));
    Ok(())
}
