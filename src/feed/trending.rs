use std::cmp::Reverse;

use serde::Serialize;

use crate::error::ServiceResult;
use crate::models::group::{Group, GroupQuery};
use crate::models::post::{Post, PostOrder, PostQuery, PostView};
use crate::services::groups::GroupService;
use crate::services::posts::PostService;

/// Counters the trending score is computed from.
pub trait Engagement {
    fn upvotes(&self) -> i32;
    fn downvotes(&self) -> i32;
    fn comment_count(&self) -> i32;

    /// Net score plus two points per comment.
    fn engagement_score(&self) -> i64 {
        i64::from(self.upvotes()) - i64::from(self.downvotes())
            + i64::from(self.comment_count()) * 2
    }
}

impl Engagement for Post {
    fn upvotes(&self) -> i32 {
        self.upvotes
    }

    fn downvotes(&self) -> i32 {
        self.downvotes
    }

    fn comment_count(&self) -> i32 {
        self.comment_count
    }
}

impl Engagement for PostView {
    fn upvotes(&self) -> i32 {
        self.post.upvotes
    }

    fn downvotes(&self) -> i32 {
        self.post.downvotes
    }

    fn comment_count(&self) -> i32 {
        self.post.comment_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub score: i64,
    pub item: T,
}

/// Highest engagement first. Ties keep their input order.
pub fn rank<T: Engagement>(items: impl IntoIterator<Item = T>) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| Ranked {
            score: item.engagement_score(),
            item,
        })
        .collect();
    ranked.sort_by_key(|r| Reverse(r.score));
    ranked
}

pub fn total_engagement<T>(ranked: &[Ranked<T>]) -> i64 {
    ranked.iter().map(|r| r.score).sum()
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingBoard {
    pub posts: Vec<Ranked<PostView>>,
    pub popular_groups: Vec<Group>,
}

impl TrendingBoard {
    pub fn total_engagement(&self) -> i64 {
        total_engagement(&self.posts)
    }

    /// The "recent" tab: the same posts, reversed.
    pub fn reversed(&self) -> impl Iterator<Item = &PostView> {
        self.posts.iter().rev().map(|r| &r.item)
    }
}

/// Most-upvoted posts re-ranked by engagement, plus the popular groups.
#[tracing::instrument(skip(store))]
pub async fn trending<S: PostService + GroupService>(
    store: &S,
    post_limit: i64,
    group_limit: i64,
) -> ServiceResult<TrendingBoard> {
    let query = PostQuery {
        order: PostOrder::MostUpvoted,
        ..PostQuery::newest(post_limit)
    };
    let posts = store.list_posts(&query).await?;
    let popular_groups = store.list_groups(&GroupQuery::popular(group_limit)).await?;

    Ok(TrendingBoard {
        posts: rank(posts),
        popular_groups,
    })
}
