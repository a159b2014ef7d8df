use serde::Serialize;

use crate::error::ServiceResult;
use crate::models::comment::{CommentOrder, CommentQuery, CommentView};
use crate::models::post::{PostQuery, PostView};
use crate::services::comments::CommentService;
use crate::services::groups::GroupService;
use crate::services::posts::PostService;

use super::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub total_posts: usize,
    pub total_upvotes: i64,
    pub total_comments: usize,
    pub joined_groups: usize,
}

impl DashboardStats {
    /// Stats over the fetched (limited) activity.
    pub fn from_activity(posts: &[PostView], comments: &[CommentView], joined_groups: usize) -> Self {
        Self {
            total_posts: posts.len(),
            total_upvotes: posts.iter().map(|p| i64::from(p.post.upvotes)).sum(),
            total_comments: comments.len(),
            joined_groups,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub posts: Vec<PostView>,
    pub comments: Vec<CommentView>,
    pub stats: DashboardStats,
}

pub async fn dashboard<S: PostService + CommentService + GroupService>(
    store: &S,
    viewer: &Viewer,
    limit: i64,
) -> ServiceResult<Dashboard> {
    let user_id = viewer.require()?;

    let posts = store
        .list_posts(&PostQuery::by_author(user_id).limit(limit))
        .await?;
    let comments = store
        .list_comments(&CommentQuery {
            author_id: Some(user_id),
            order: CommentOrder::Newest,
            limit: Some(limit),
            ..Default::default()
        })
        .await?;
    let joined = store.memberships(user_id).await?.len();

    let stats = DashboardStats::from_activity(&posts, &comments, joined);
    Ok(Dashboard {
        posts,
        comments,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::comments::add_comment;
    use crate::feed::groups::{create_group, GroupDraft};
    use crate::feed::posts::{create_post, PostDraft};
    use crate::feed::votes::{cast_vote, VoteTally};
    use crate::models::vote::VoteDirection;
    use crate::services::media::LocalMediaStore;
    use crate::services::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[tokio::test]
    async fn stats_cover_posts_comments_and_groups() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let me = Viewer::user(Uuid::now_v7());
        let group = create_group(
            &store,
            &media,
            &me,
            GroupDraft {
                name: "indie".into(),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap();
        let post = create_post(
            &store,
            &media,
            &me,
            PostDraft {
                title: "Hollow Knight tips".into(),
                group_id: Some(group.id),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        add_comment(&store, &me, post.id, None, "pin this").await.unwrap();
        for _ in 0..3 {
            let voter = Viewer::user(Uuid::now_v7());
            cast_vote(&store, &voter, post.id, VoteTally::default(), VoteDirection::Up)
                .await
                .unwrap();
        }

        let d = dashboard(&store, &me, 10).await.unwrap();

        assert_eq!(
            d.stats,
            DashboardStats {
                total_posts: 1,
                total_upvotes: 3,
                total_comments: 1,
                joined_groups: 1,
            }
        );
    }

    #[tokio::test]
    async fn anonymous_viewer_has_no_dashboard() {
        let store = MemoryStore::new();
        assert!(dashboard(&store, &Viewer::anonymous(), 10).await.is_err());
    }
}
