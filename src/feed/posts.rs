use chrono::Utc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::helpers::{non_blank, OrNotFound};
use crate::models::post::{CreatePost, MediaKind, Post, PostQuery, PostView, UpdatePost};
use crate::services::groups::GroupService;
use crate::services::media::{MediaStore, Upload, POST_MEDIA};
use crate::services::posts::PostService;
use crate::services::votes::VoteService;

use super::votes::{tally_for, VoteTally};
use super::Viewer;

/// What the create/edit forms submit.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub group_id: Option<Uuid>,
    pub tags: Vec<String>,
}

/// Trimmed, `#`-stripped, non-empty, first occurrence wins.
pub fn normalize_tags<S: AsRef<str>>(raw: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for t in raw {
        let t = t.as_ref().trim().trim_start_matches('#').trim();
        if !t.is_empty() && !tags.iter().any(|x| x == t) {
            tags.push(t.to_string());
        }
    }
    tags
}

/// Split a free-text tag field on commas and whitespace.
pub fn parse_tags(field: &str) -> Vec<String> {
    normalize_tags(field.split(|c: char| c == ',' || c.is_whitespace()))
}

fn require_title(draft: &PostDraft) -> ServiceResult<String> {
    non_blank(&draft.title).ok_or_else(|| ServiceError::validation("Title is required"))
}

#[tracing::instrument(skip_all, fields(viewer = ?viewer.user_id, title = %draft.title))]
pub async fn create_post<S: PostService + GroupService>(
    store: &S,
    media: &dyn MediaStore,
    viewer: &Viewer,
    draft: PostDraft,
    upload: Option<Upload>,
) -> ServiceResult<Post> {
    let author_id = viewer.require()?;
    let title = require_title(&draft)?;
    let group_id = draft
        .group_id
        .ok_or_else(|| ServiceError::validation("Please select a group"))?;
    let kind = match &upload {
        None => MediaKind::Text,
        Some(u) => MediaKind::from_content_type(&u.content_type)
            .ok_or_else(|| ServiceError::validation("Media must be an image or a video"))?,
    };

    store.get_group(group_id).await.or_not_found("Group")?;

    let media_url = match &upload {
        Some(u) => Some(media.put(POST_MEDIA, u).await?),
        None => None,
    };

    let post = store
        .insert_post(&CreatePost {
            title,
            content: non_blank(&draft.content),
            media_url,
            post_type: kind,
            tags: normalize_tags(&draft.tags),
            author_id,
            group_id,
        })
        .await?;
    tracing::info!(post_id = %post.id, "post published");
    Ok(post)
}

#[tracing::instrument(skip(store, viewer, draft))]
pub async fn edit_post<P: PostService>(
    store: &P,
    viewer: &Viewer,
    id: Uuid,
    draft: PostDraft,
) -> ServiceResult<Post> {
    let existing = store.get_post(id).await.or_not_found("Post")?;
    viewer.require_owner(existing.post.author_id, "post")?;
    let title = require_title(&draft)?;

    Ok(store
        .update_post(
            id,
            &UpdatePost {
                title,
                content: non_blank(&draft.content),
                tags: normalize_tags(&draft.tags),
                updated_at: Utc::now(),
            },
        )
        .await?)
}

#[tracing::instrument(skip(store, viewer))]
pub async fn delete_post<P: PostService>(store: &P, viewer: &Viewer, id: Uuid) -> ServiceResult<()> {
    let existing = store.get_post(id).await.or_not_found("Post")?;
    viewer.require_owner(existing.post.author_id, "post")?;

    store.delete_post(id).await?;
    tracing::info!(post_id = %id, "post deleted");
    Ok(())
}

/// A post with the viewer's vote state seeded from the store.
pub async fn post_detail<S: PostService + VoteService>(
    store: &S,
    viewer: &Viewer,
    id: Uuid,
) -> ServiceResult<(PostView, VoteTally)> {
    let view = store.get_post(id).await.or_not_found("Post")?;
    let tally = tally_for(store, viewer, &view.post).await?;
    Ok((view, tally))
}

/// Any post listing, each with the viewer's vote state.
pub async fn feed<S: PostService + VoteService>(
    store: &S,
    viewer: &Viewer,
    query: &PostQuery,
) -> ServiceResult<Vec<(PostView, VoteTally)>> {
    let posts = store.list_posts(query).await?;
    let mut out = Vec::with_capacity(posts.len());
    for view in posts {
        let tally = tally_for(store, viewer, &view.post).await?;
        out.push((view, tally));
    }
    Ok(out)
}
