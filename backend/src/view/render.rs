//! Rendering of a post and its comment tree.

use std::collections::HashSet;
use std::fmt::{Display, Write};

use chrono::{DateTime, Local, TimeZone};

use crate::api::{CommentId, CommentView, UserId};
use crate::state::PostState;

const INDENT: &str = "  ";

/// Presentation-only state that survives re-renders.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    hidden: HashSet<CommentId>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_replies(&mut self, id: CommentId) {
        self.hidden.insert(id);
    }

    pub fn show_replies(&mut self, id: CommentId) {
        self.hidden.remove(&id);
    }

    pub fn toggle_replies(&mut self, id: CommentId) {
        if !self.hidden.remove(&id) {
            self.hidden.insert(id);
        }
    }

    pub fn are_replies_hidden(&self, id: CommentId) -> bool {
        self.hidden.contains(&id)
    }
}

/// Medium date, short time: `Mar 5, 2024, 2:07 PM`.
pub fn format_date<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%b %-d, %Y, %-I:%M %p").to_string()
}

/// Render the post with its comments, or the loading/error placeholder.
pub fn render_post(state: &PostState, view: &ViewState) -> String {
    if state.is_loading() {
        return "Loading\n".to_string();
    }
    if let Some(error) = state.error() {
        return format!("{}\n", error);
    }
    let Some(post) = state.post() else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", post.title);
    let _ = writeln!(out, "{}", "=".repeat(post.title.chars().count()));
    let _ = writeln!(out, "{}", post.body);
    let _ = writeln!(out);
    let _ = writeln!(out, "Comments");
    let _ = writeln!(out, "--------");

    let renderer = TreeRenderer {
        state,
        view,
        current_user: state.current_user(),
    };
    renderer.write_list(&mut out, state.root_comments(), 0);
    out
}

struct TreeRenderer<'a> {
    state: &'a PostState,
    view: &'a ViewState,
    current_user: Option<UserId>,
}

impl TreeRenderer<'_> {
    fn write_list(&self, out: &mut String, comments: &[CommentView], depth: usize) {
        for comment in comments {
            self.write_comment(out, comment, depth);
        }
    }

    fn write_comment(&self, out: &mut String, comment: &CommentView, depth: usize) {
        let pad = INDENT.repeat(depth);
        let _ = writeln!(
            out,
            "{}{} | {} | {}",
            pad,
            comment.user.name,
            format_date(&comment.created_at.with_timezone(&Local)),
            comment.id
        );
        for line in comment.message.lines() {
            let _ = writeln!(out, "{}{}", pad, line);
        }

        let likes = if comment.liked_by_me {
            format!("Likes: {} (liked)", comment.like_count)
        } else {
            format!("Likes: {}", comment.like_count)
        };
        let mut actions = vec!["Reply"];
        if self.current_user == Some(comment.user.id) {
            actions.push("Edit");
            actions.push("Delete");
        }
        let _ = writeln!(out, "{}{} [{}]", pad, likes, actions.join("] ["));

        let replies = self.state.get_replies(comment.id);
        if replies.is_empty() {
            return;
        }
        if self.view.are_replies_hidden(comment.id) {
            let _ = writeln!(out, "{}{}Show Replies", pad, INDENT);
        } else {
            self.write_list(out, replies, depth + 1);
        }
    }
}
