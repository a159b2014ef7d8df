use chrono::Utc;
use maud::{html, Markup, Render};
use uuid::Uuid;

use crate::feed::votes::{VoteState, VoteTally};
use crate::models::group::Group;
use crate::models::post::{MediaKind, PostView};

use super::{avatar, signed, time_ago};

/// Up/down buttons and the net score. Re-rendered in place after each click.
pub fn vote_controls(post_id: Uuid, tally: &VoteTally) -> Markup {
    let up = if tally.state == VoteState::Upvoted { "vote active" } else { "vote" };
    let down = if tally.state == VoteState::Downvoted { "vote active" } else { "vote" };
    html! {
        div.vote-controls #{"votes-" (post_id)} {
            button class=(up)
                hx-post={"/posts/" (post_id) "/vote"}
                hx-vals=r#"{"direction": "up"}"#
                hx-target={"#votes-" (post_id)}
                hx-swap="outerHTML" { "▲" }
            span.score { (signed(tally.net_score())) }
            button class=(down)
                hx-post={"/posts/" (post_id) "/vote"}
                hx-vals=r#"{"direction": "down"}"#
                hx-target={"#votes-" (post_id)}
                hx-swap="outerHTML" { "▼" }
        }
    }
}

fn media(view: &PostView) -> Markup {
    let post = &view.post;
    html! {
        @if let Some(url) = &post.media_url {
            @match post.post_type {
                MediaKind::Image => img.post-media src=(url) alt=(post.title);,
                MediaKind::Video => video.post-media src=(url) controls preload="metadata" {},
                MediaKind::Text => {},
            }
        }
    }
}

fn tags(view: &PostView) -> Markup {
    html! {
        @if !view.post.tags.is_empty() {
            div.tags {
                @for tag in &view.post.tags {
                    span.badge { "#" (tag) }
                }
            }
        }
    }
}

fn header(view: &PostView) -> Markup {
    html! {
        header.post-header {
            (avatar(&view.author))
            span.author { (view.author.display_name()) }
            a.badge href={"/groups/" (view.group_name())} { "r/" (view.group_name()) }
            span.muted { (time_ago(view.post.created_at, Utc::now())) }
        }
    }
}

/// Feed entry.
pub fn card(view: &PostView, tally: &VoteTally) -> Markup {
    let post = &view.post;
    html! {
        article.card.post #{"post-" (post.id)} {
            (header(view))
            h2 { a href={"/posts/" (post.id)} { (post.title) } }
            @if let Some(content) = &post.content {
                p.content { (content) }
            }
            (media(view))
            (tags(view))
            footer.post-actions {
                (vote_controls(post.id, tally))
                a.comments-link href={"/posts/" (post.id)} { "💬 " (post.comment_count) }
            }
        }
    }
}

/// Card for listings that don't carry the viewer's vote.
impl Render for PostView {
    fn render(&self) -> Markup {
        let tally = VoteTally::new(self.post.upvotes, self.post.downvotes, VoteState::Unvoted);
        card(self, &tally)
    }
}

pub fn list(posts: &[(PostView, VoteTally)], empty_msg: &str) -> Markup {
    html! {
        @if posts.is_empty() {
            (super::layout::empty(empty_msg))
        } @else {
            div.post-list {
                @for (view, tally) in posts {
                    (card(view, tally))
                }
            }
        }
    }
}

pub fn detail(view: &PostView, tally: &VoteTally, is_author: bool) -> Markup {
    let post = &view.post;
    html! {
        a.back href="/" { "← Back" }
        article.card.post-detail #{"post-" (post.id)} {
            (header(view))
            h1 { (post.title) }
            @if let Some(content) = &post.content {
                div.content { (content) }
            }
            (media(view))
            (tags(view))
            footer.post-actions {
                (vote_controls(post.id, tally))
                @if is_author {
                    button hx-post={"/posts/" (post.id) "/delete"}
                        hx-confirm="Delete this post?" { "Delete" }
                }
            }
            @if is_author {
                (edit_form(view))
            }
        }
        (super::comment::collapsed(post.id, post.comment_count))
    }
}

fn edit_form(view: &PostView) -> Markup {
    let post = &view.post;
    let errors = format!("post-edit-errors-{}", post.id);
    html! {
        details.edit-post {
            summary { "Edit" }
            form hx-post={"/posts/" (post.id) "/edit"} hx-target={"#" (errors)} {
                input name="title" value=(post.title) required;
                textarea name="content" rows="6" { (post.content.as_deref().unwrap_or_default()) }
                input name="tags" value=(post.tags.join(", "));
                div id=(errors) {}
                button type="submit" { "Save" }
            }
        }
    }
}

/// New-post form; `groups` fills the group picker.
pub fn create_form(groups: &[Group]) -> Markup {
    html! {
        form.card #create-post hx-post="/posts" hx-encoding="multipart/form-data" hx-target="#create-post-errors" {
            h2 { "Create New Post" }
            label for="title" { "Title *" }
            input #title name="title" placeholder="Enter post title" required;
            label for="group_id" { "Group *" }
            select #group_id name="group_id" required {
                option value="" { "Select a group" }
                @for g in groups {
                    option value=(g.id) { "r/" (g.name) }
                }
            }
            label for="content" { "Content" }
            textarea #content name="content" rows="6" placeholder="Share your thoughts..." {}
            label for="media" { "Media (Optional)" }
            input #media type="file" name="media" accept="image/*,video/*";
            label for="tags" { "Tags" }
            input #tags name="tags" placeholder="Comma separated";
            div #create-post-errors {}
            button type="submit" { "Publish Post" }
        }
    }
}
