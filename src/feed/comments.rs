use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::helpers::{non_blank, OrNotFound};
use crate::models::comment::{Comment, CommentQuery, CommentView, CreateComment};
use crate::services::comments::CommentService;

use super::Viewer;

/// Anything that carries a comment record.
pub trait Threaded {
    fn comment(&self) -> &Comment;
}

impl Threaded for Comment {
    fn comment(&self) -> &Comment {
        self
    }
}

impl Threaded for CommentView {
    fn comment(&self) -> &Comment {
        &self.comment
    }
}

/// Two-level display structure for one post's comments.
///
/// `replies_by_parent` is keyed by the direct parent, so a reply to a reply
/// is found under the reply it answers. For display, [`CommentTree::thread`]
/// flattens every descendant of a top-level comment into one list.
#[derive(Debug, Clone)]
pub struct CommentTree<T> {
    top_level: Vec<T>,
    replies_by_parent: HashMap<Uuid, Vec<T>>,
}

impl<T: Threaded> CommentTree<T> {
    pub fn build(comments: impl IntoIterator<Item = T>) -> Self {
        let mut all: Vec<T> = comments.into_iter().collect();
        // Stable: equal timestamps keep fetch order.
        all.sort_by_key(|c| c.comment().created_at);

        let mut top_level = Vec::new();
        let mut replies_by_parent: HashMap<Uuid, Vec<T>> = HashMap::new();
        for c in all {
            match c.comment().parent_id {
                None => top_level.push(c),
                Some(parent) => replies_by_parent.entry(parent).or_default().push(c),
            }
        }

        Self {
            top_level,
            replies_by_parent,
        }
    }

    pub fn top_level(&self) -> &[T] {
        &self.top_level
    }

    /// Direct replies to `parent`, oldest first.
    pub fn replies(&self, parent: Uuid) -> &[T] {
        self.replies_by_parent
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Everything shown under the top-level comment `top`: its replies and
    /// their replies at any depth, oldest first.
    pub fn thread(&self, top: Uuid) -> Vec<&T> {
        let mut out: Vec<&T> = Vec::new();
        let mut seen = HashSet::from([top]);
        let mut frontier = vec![top];
        while let Some(parent) = frontier.pop() {
            for reply in self.replies(parent) {
                let id = reply.comment().id;
                if seen.insert(id) {
                    out.push(reply);
                    frontier.push(id);
                }
            }
        }
        out.sort_by_key(|c| c.comment().created_at);
        out
    }

    /// Replies whose ancestry never reaches a top-level comment in this set.
    pub fn orphans(&self) -> Vec<&T> {
        let mut reachable = HashSet::new();
        for top in &self.top_level {
            reachable.extend(self.thread(top.comment().id).iter().map(|c| c.comment().id));
        }
        self.replies_by_parent
            .values()
            .flatten()
            .filter(|c| !reachable.contains(&c.comment().id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.top_level.len() + self.replies_by_parent.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Post a comment, or a reply when `parent_id` is set. Replies must target an
/// existing top-level comment of the same post.
#[tracing::instrument(skip(store, viewer, body))]
pub async fn add_comment<C: CommentService>(
    store: &C,
    viewer: &Viewer,
    post_id: Uuid,
    parent_id: Option<Uuid>,
    body: &str,
) -> ServiceResult<Comment> {
    let author_id = viewer.require()?;
    let content = non_blank(body).ok_or_else(|| ServiceError::validation("Comment can't be empty"))?;

    if let Some(parent_id) = parent_id {
        let parent = store.get_comment(parent_id).await?;
        match parent {
            Some(p) if p.post_id == post_id && p.is_top_level() => {}
            _ => {
                return Err(ServiceError::validation(
                    "Replies must answer a top-level comment on the same post",
                ))
            }
        }
    }

    let comment = store
        .insert_comment(&CreateComment {
            post_id,
            author_id,
            parent_id,
            content,
        })
        .await?;
    tracing::info!(comment_id = %comment.id, "comment posted");
    Ok(comment)
}

#[tracing::instrument(skip(store, viewer, body))]
pub async fn edit_comment<C: CommentService>(
    store: &C,
    viewer: &Viewer,
    id: Uuid,
    body: &str,
) -> ServiceResult<Comment> {
    let existing = store.get_comment(id).await.or_not_found("Comment")?;
    viewer.require_owner(existing.author_id, "comment")?;
    let content = non_blank(body).ok_or_else(|| ServiceError::validation("Comment can't be empty"))?;

    Ok(store.update_comment(id, &content, Utc::now()).await?)
}

#[tracing::instrument(skip(store, viewer))]
pub async fn delete_comment<C: CommentService>(
    store: &C,
    viewer: &Viewer,
    id: Uuid,
) -> ServiceResult<Comment> {
    let existing = store.get_comment(id).await.or_not_found("Comment")?;
    viewer.require_owner(existing.author_id, "comment")?;

    store.delete_comment(id).await?;
    tracing::info!(comment_id = %id, "comment deleted");
    Ok(existing)
}

/// The comment list under one post. Collapsed until expanded; every
/// successful change refetches, a failed one leaves the list as it was.
#[derive(Debug, Clone)]
pub struct CommentSection {
    post_id: Uuid,
    expanded: bool,
    comments: Vec<CommentView>,
}

impl CommentSection {
    pub fn new(post_id: Uuid) -> Self {
        Self {
            post_id,
            expanded: false,
            comments: Vec::new(),
        }
    }

    /// Expanded section with comments already fetched.
    pub async fn load<C: CommentService>(store: &C, post_id: Uuid) -> ServiceResult<Self> {
        let mut section = Self::new(post_id);
        section.expand(store).await?;
        Ok(section)
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn comments(&self) -> &[CommentView] {
        &self.comments
    }

    pub async fn expand<C: CommentService>(&mut self, store: &C) -> ServiceResult<()> {
        self.expanded = true;
        self.refresh(store).await
    }

    pub fn collapse(&mut self) {
        self.expanded = false;
    }

    pub async fn refresh<C: CommentService>(&mut self, store: &C) -> ServiceResult<()> {
        if !self.expanded {
            return Ok(());
        }
        self.comments = store
            .list_comments(&CommentQuery::for_post(self.post_id))
            .await?;
        let hidden = self.tree().orphans().len();
        if hidden > 0 {
            tracing::warn!(post_id = %self.post_id, hidden, "replies without a top-level ancestor");
        }
        Ok(())
    }

    pub fn tree(&self) -> CommentTree<&CommentView> {
        CommentTree::build(self.comments.iter())
    }

    pub async fn add<C: CommentService>(
        &mut self,
        store: &C,
        viewer: &Viewer,
        parent_id: Option<Uuid>,
        body: &str,
    ) -> ServiceResult<Comment> {
        let c = add_comment(store, viewer, self.post_id, parent_id, body).await?;
        self.refresh(store).await?;
        Ok(c)
    }

    pub async fn edit<C: CommentService>(
        &mut self,
        store: &C,
        viewer: &Viewer,
        id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        let c = edit_comment(store, viewer, id, body).await?;
        self.refresh(store).await?;
        Ok(c)
    }

    pub async fn delete<C: CommentService>(
        &mut self,
        store: &C,
        viewer: &Viewer,
        id: Uuid,
    ) -> ServiceResult<()> {
        delete_comment(store, viewer, id).await?;
        self.refresh(store).await
    }
}

impl<T: Threaded> Threaded for &T {
    fn comment(&self) -> &Comment {
        (*self).comment()
    }
}
