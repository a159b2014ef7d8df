use maud::{html, Markup};
use uuid::Uuid;

use crate::feed::groups::GroupPage;
use crate::feed::Viewer;
use crate::models::group::Group;

fn members(n: i32) -> String {
    format!("{n} {}", if n == 1 { "member" } else { "members" })
}

fn membership_button(group: &Group, joined: bool) -> Markup {
    let (action, label) = if joined { ("leave", "Leave") } else { ("join", "Join") };
    html! {
        button.membership #{"membership-" (group.id)}
            hx-post={"/groups/" (group.name) "/" (action)}
            hx-target="closest .group-card"
            hx-swap="outerHTML" { (label) }
    }
}

fn icon(group: &Group) -> Markup {
    html! {
        @if let Some(url) = &group.image_url {
            img.group-icon src=(url) alt=(group.name);
        } @else {
            span.group-icon.fallback { (group.name.chars().next().unwrap_or('#').to_ascii_uppercase()) }
        }
    }
}

/// One group in the directory, with a join/leave button when signed in.
pub fn card(group: &Group, joined: Option<bool>) -> Markup {
    html! {
        div.card.group-card #{"group-" (group.id)} {
            (icon(group))
            div {
                a href={"/groups/" (group.name)} { h3 { "r/" (group.name) } }
                @if !group.description.is_empty() {
                    p.muted { (group.description) }
                }
                span.small { (members(group.member_count)) }
            }
            @if let Some(joined) = joined {
                (membership_button(group, joined))
            }
        }
    }
}

pub fn directory(groups: &[Group], joined: &[Uuid], viewer: &Viewer, search: Option<&str>) -> Markup {
    html! {
        div.page-header {
            h1 { "Groups" }
            input type="search" name="q" placeholder="Search groups..." value=[search]
                hx-get="/groups" hx-trigger="keyup changed delay:300ms" hx-target="#group-list"
                hx-select="#group-list" hx-swap="outerHTML";
        }
        @if viewer.user_id.is_some() {
            (create_form())
        }
        div #group-list {
            @if groups.is_empty() {
                (super::layout::empty("No groups found"))
            }
            @for g in groups {
                (card(g, viewer.user_id.map(|_| joined.contains(&g.id))))
            }
        }
    }
}

pub fn create_form() -> Markup {
    html! {
        details.card {
            summary { "Create Group" }
            form hx-post="/groups" hx-encoding="multipart/form-data" hx-target="#create-group-errors" {
                label for="group-name" { "Name *" }
                input #group-name name="name" placeholder="e.g. speedrunning" required;
                label for="group-description" { "Description" }
                textarea #group-description name="description" rows="3" {}
                label for="group-image" { "Image" }
                input #group-image type="file" name="image" accept="image/*";
                div #create-group-errors {}
                button type="submit" { "Create" }
            }
        }
    }
}

pub fn page(p: &GroupPage, viewer: &Viewer) -> Markup {
    let joined = viewer.user_id.map(|_| p.is_member);
    html! {
        (card(&p.group, joined))
        h2 { "Posts" }
        (super::post::list(&p.posts, "No posts in this group yet"))
    }
}

/// Sidebar list of the most-joined groups.
pub fn popular(groups: &[Group]) -> Markup {
    html! {
        aside.card.popular-groups {
            h3 { "Popular Groups" }
            ul {
                @for g in groups {
                    li {
                        a href={"/groups/" (g.name)} { "r/" (g.name) }
                        span.muted.small { " " (members(g.member_count)) }
                    }
                }
            }
        }
    }
}
