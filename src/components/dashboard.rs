use maud::{html, Markup};

use crate::feed::dashboard::{Dashboard, DashboardStats};

fn stat(label: &str, value: impl std::fmt::Display) -> Markup {
    html! {
        div.card.stat {
            span.stat-value { (value) }
            span.stat-label.muted { (label) }
        }
    }
}

pub fn stats(s: &DashboardStats) -> Markup {
    html! {
        div.stats {
            (stat("Posts", s.total_posts))
            (stat("Upvotes", s.total_upvotes))
            (stat("Comments", s.total_comments))
            (stat("Groups", s.joined_groups))
        }
    }
}

pub fn page(d: &Dashboard) -> Markup {
    html! {
        h1 { "Dashboard" }
        (stats(&d.stats))
        div.columns {
            section {
                h2 { "Your Posts" }
                @if d.posts.is_empty() {
                    (super::layout::empty("No posts yet"))
                }
                @for p in &d.posts {
                    (p)
                }
            }
            section {
                h2 { "Your Comments" }
                @if d.comments.is_empty() {
                    (super::layout::empty("No comments yet"))
                } @else {
                    (super::comment::activity(&d.comments))
                }
            }
        }
    }
}
