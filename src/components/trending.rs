use maud::{html, Markup};

use crate::feed::trending::{Ranked, TrendingBoard};
use crate::models::post::PostView;

fn entry(position: usize, r: &Ranked<PostView>) -> Markup {
    html! {
        div.trending-entry {
            @if position == 0 {
                span.badge.hot { "#1 Trending" }
            } @else {
                span.rank.muted { "#" (position + 1) }
            }
            (r.item)
            span.small.muted { (r.score) " engagement" }
        }
    }
}

/// `recent` shows the same posts with the ranking reversed.
pub fn page(board: &TrendingBoard, recent: bool) -> Markup {
    html! {
        div.page-header {
            h1 { "Trending" }
            div.tabs {
                a class=(if recent { "tab" } else { "tab active" }) href="/trending" { "Hot" }
                a class=(if recent { "tab active" } else { "tab" }) href="/trending?tab=recent" { "Recent" }
            }
        }
        div.stats {
            div.card.stat {
                span.stat-value { (board.posts.len()) }
                span.stat-label.muted { "Trending posts" }
            }
            div.card.stat {
                span.stat-value { (board.popular_groups.len()) }
                span.stat-label.muted { "Popular groups" }
            }
            div.card.stat {
                span.stat-value { (board.total_engagement()) }
                span.stat-label.muted { "Total engagement" }
            }
        }
        div.columns {
            section {
                @if board.posts.is_empty() {
                    (super::layout::empty("Nothing trending yet"))
                } @else if recent {
                    @for p in board.reversed() {
                        (p)
                    }
                } @else {
                    @for (i, r) in board.posts.iter().enumerate() {
                        (entry(i, r))
                    }
                }
            }
            (super::group::popular(&board.popular_groups))
        }
    }
}
