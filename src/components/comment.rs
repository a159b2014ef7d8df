use chrono::Utc;
use maud::{html, Markup};
use uuid::Uuid;

use crate::feed::comments::CommentSection;
use crate::feed::Viewer;
use crate::models::comment::CommentView;

use super::{avatar, time_ago};

fn count_label(n: i32) -> String {
    format!("{n} {}", if n == 1 { "comment" } else { "comments" })
}

/// Toggle shown before the section is expanded.
pub fn collapsed(post_id: Uuid, comment_count: i32) -> Markup {
    html! {
        section.comments #{"comments-" (post_id)} {
            button.toggle hx-get={"/posts/" (post_id) "/comments"}
                hx-target={"#comments-" (post_id)}
                hx-swap="outerHTML" {
                "💬 " (count_label(comment_count)) " ▾"
            }
        }
    }
}

fn form(post_id: Uuid, parent: Option<(Uuid, &str)>) -> Markup {
    let placeholder = match parent {
        Some((_, name)) => format!("Reply to {name}..."),
        None => "Write a comment...".to_string(),
    };
    html! {
        form.comment-form hx-post={"/posts/" (post_id) "/comments"}
            hx-target={"#comments-" (post_id)} hx-swap="outerHTML" {
            @if let Some((parent_id, _)) = parent {
                input type="hidden" name="parent_id" value=(parent_id);
            }
            textarea name="content" placeholder=(placeholder) required {}
            button type="submit" { @if parent.is_some() { "Reply" } @else { "Post Comment" } }
        }
    }
}

fn comment(view: &CommentView, viewer: &Viewer) -> Markup {
    let c = &view.comment;
    html! {
        div.comment #{"comment-" (c.id)} {
            (avatar(&view.author))
            div.comment-body {
                div.comment-meta {
                    span.author { (view.author.display_name()) }
                    span.muted { (time_ago(c.created_at, Utc::now())) }
                    @if c.is_edited() {
                        span.muted.small { "(edited)" }
                    }
                }
                p.comment-text { (c.content) }
                @if viewer.is(c.author_id) {
                    div.comment-actions {
                        details {
                            summary { "Edit" }
                            form hx-post={"/comments/" (c.id) "/edit"}
                                hx-target={"#comments-" (c.post_id)} hx-swap="outerHTML" {
                                textarea name="content" required { (c.content) }
                                button type="submit" { "Save" }
                            }
                        }
                        button hx-post={"/comments/" (c.id) "/delete"}
                            hx-target={"#comments-" (c.post_id)} hx-swap="outerHTML" { "Delete" }
                    }
                }
            }
        }
    }
}

/// Expanded section: form, then each top-level comment with its thread.
/// A collapsed section renders as its toggle.
pub fn section(s: &CommentSection, viewer: &Viewer) -> Markup {
    let post_id = s.post_id();
    if !s.is_expanded() {
        return collapsed(post_id, s.comments().len() as i32);
    }
    let tree = s.tree();
    html! {
        section.comments.expanded #{"comments-" (post_id)} {
            button.toggle hx-get={"/posts/" (post_id) "/comments?collapse=true"}
                hx-target={"#comments-" (post_id)} hx-swap="outerHTML" {
                "💬 " (count_label(s.comments().len() as i32)) " ▴"
            }
            h3 { "Comments" }
            @if viewer.user_id.is_some() {
                (form(post_id, None))
            }
            @if tree.is_empty() {
                p.muted { "No comments yet. Be the first to comment!" }
            }
            @for top in tree.top_level() {
                div.thread {
                    (comment(top, viewer))
                    @if viewer.user_id.is_some() {
                        details.reply {
                            summary { "Reply" }
                            (form(post_id, Some((top.comment.id, top.author.display_name()))))
                        }
                    }
                    div.replies {
                        @for reply in tree.thread(top.comment.id) {
                            (comment(reply, viewer))
                        }
                    }
                }
            }
        }
    }
}

/// The viewer's recent comments, as listed on the dashboard.
pub fn activity(comments: &[CommentView]) -> Markup {
    html! {
        ul.activity {
            @for c in comments {
                li {
                    a href={"/posts/" (c.comment.post_id)} { (c.comment.content) }
                    span.muted { " · " (time_ago(c.comment.created_at, Utc::now())) }
                }
            }
        }
    }
}
