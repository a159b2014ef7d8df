//! In-process store for development and tests.
//!
//! Mirrors what the Postgres schema enforces: unique keys, foreign keys,
//! cascading deletes and the trigger-maintained counters.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use axum::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::author::Author;
use crate::models::comment::*;
use crate::models::group::*;
use crate::models::post::*;
use crate::models::profile::*;
use crate::models::vote::Vote;

use super::comments::CommentService;
use super::groups::GroupService;
use super::posts::PostService;
use super::profiles::ProfileService;
use super::votes::VoteService;
use super::Svc;

#[derive(Default)]
struct Tables {
    posts: DashMap<Uuid, Post>,
    comments: DashMap<Uuid, Comment>,
    votes: DashMap<(Uuid, Uuid), Vote>,
    groups: DashMap<Uuid, Group>,
    members: DashMap<(Uuid, Uuid), GroupMember>,
    profiles: DashMap<Uuid, Profile>,
    // Unique indexes: name -> owning row.
    group_names: DashMap<String, Uuid>,
    usernames: DashMap<String, Uuid>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl Svc for MemoryStore {}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn author(&self, user_id: Uuid) -> Author {
        self.tables
            .profiles
            .get(&user_id)
            .map(|p| Author::from(p.value()))
            .unwrap_or(Author::Missing)
    }

    fn post_view(&self, post: Post) -> PostView {
        let group_name = self
            .tables
            .groups
            .get(&post.group_id)
            .map(|g| g.name.clone());
        PostView {
            author: self.author(post.author_id),
            group_name,
            post,
        }
    }

    fn adjust_post(&self, post_id: Uuid, f: impl FnOnce(&mut Post)) {
        if let Some(mut post) = self.tables.posts.get_mut(&post_id) {
            f(&mut post);
        }
    }

    fn adjust_votes(&self, post_id: Uuid, vote_type: i16, delta: i32) {
        self.adjust_post(post_id, |p| match vote_type {
            1 => p.upvotes = (p.upvotes + delta).max(0),
            -1 => p.downvotes = (p.downvotes + delta).max(0),
            _ => {}
        });
    }

    /// `id` and every comment below it.
    fn comment_subtree(&self, id: Uuid) -> Vec<Uuid> {
        let mut found = vec![id];
        let mut i = 0;
        while i < found.len() {
            let parent = found[i];
            found.extend(
                self.tables
                    .comments
                    .iter()
                    .filter(|c| c.parent_id == Some(parent))
                    .map(|c| c.id),
            );
            i += 1;
        }
        found
    }
}

/// Reserves `name` for `owner` in one step, like a unique index insert.
/// Re-claiming a name the owner already holds succeeds.
fn claim(index: &DashMap<String, Uuid>, name: &str, owner: Uuid, constraint: &str) -> anyhow::Result<()> {
    match index.entry(name.to_string()) {
        Entry::Occupied(held) if *held.get() != owner => {
            bail!("duplicate key value violates unique constraint \"{constraint}\"")
        }
        Entry::Occupied(_) => Ok(()),
        Entry::Vacant(slot) => {
            slot.insert(owner);
            Ok(())
        }
    }
}

fn check_width(value: &str, max: usize) -> anyhow::Result<()> {
    if value.chars().count() > max {
        bail!("value too long for type character varying({max})");
    }
    Ok(())
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[async_trait]
impl PostService<anyhow::Error> for MemoryStore {
    async fn insert_post(&self, p: &CreatePost) -> anyhow::Result<Post> {
        if !self.tables.groups.contains_key(&p.group_id) {
            bail!("insert on posts violates foreign key: group {}", p.group_id);
        }
        let created_at = now();
        let post = Post {
            id: Uuid::now_v7(),
            title: p.title.clone(),
            content: p.content.clone(),
            media_url: p.media_url.clone(),
            post_type: p.post_type,
            tags: p.tags.clone(),
            upvotes: 0,
            downvotes: 0,
            comment_count: 0,
            author_id: p.author_id,
            group_id: p.group_id,
            created_at,
            updated_at: created_at,
        };
        self.tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, patch: &UpdatePost) -> anyhow::Result<Post> {
        let mut post = self
            .tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no post {id}"))?;
        post.title = patch.title.clone();
        post.content = patch.content.clone();
        post.tags = patch.tags.clone();
        post.updated_at = patch.updated_at;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        if self.tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        self.tables.comments.retain(|_, c| c.post_id != id);
        self.tables.votes.retain(|(post_id, _), _| *post_id != id);
        Ok(true)
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostView>> {
        let post = self.tables.posts.get(&id).map(|p| p.value().clone());
        Ok(post.map(|p| self.post_view(p)))
    }

    async fn list_posts(&self, query: &PostQuery) -> anyhow::Result<Vec<PostView>> {
        let mut posts: Vec<Post> = self
            .tables
            .posts
            .iter()
            .filter(|p| query.author_id.map_or(true, |a| p.author_id == a))
            .filter(|p| query.group_id.map_or(true, |g| p.group_id == g))
            .map(|p| p.value().clone())
            .collect();

        match query.order {
            PostOrder::Newest => posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id))),
            PostOrder::MostUpvoted => posts.sort_by(|a, b| {
                (b.upvotes, b.created_at, b.id).cmp(&(a.upvotes, a.created_at, a.id))
            }),
        }
        if let Some(limit) = query.limit {
            posts.truncate(limit.max(0) as usize);
        }

        Ok(posts.into_iter().map(|p| self.post_view(p)).collect())
    }
}

#[async_trait]
impl CommentService<anyhow::Error> for MemoryStore {
    async fn insert_comment(&self, c: &CreateComment) -> anyhow::Result<Comment> {
        if !self.tables.posts.contains_key(&c.post_id) {
            bail!("insert on comments violates foreign key: post {}", c.post_id);
        }
        if let Some(parent) = c.parent_id {
            if !self.tables.comments.contains_key(&parent) {
                bail!("insert on comments violates foreign key: parent {parent}");
            }
        }
        let created_at = now();
        let comment = Comment {
            id: Uuid::now_v7(),
            post_id: c.post_id,
            author_id: c.author_id,
            parent_id: c.parent_id,
            content: c.content.clone(),
            created_at,
            updated_at: created_at,
        };
        self.tables.comments.insert(comment.id, comment.clone());
        self.adjust_post(c.post_id, |p| p.comment_count += 1);
        Ok(comment)
    }

    async fn update_comment(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Comment> {
        let mut comment = self
            .tables
            .comments
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no comment {id}"))?;
        comment.content = content.to_string();
        comment.updated_at = updated_at;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        if !self.tables.comments.contains_key(&id) {
            return Ok(false);
        }
        for cid in self.comment_subtree(id) {
            if let Some((_, c)) = self.tables.comments.remove(&cid) {
                self.adjust_post(c.post_id, |p| p.comment_count = (p.comment_count - 1).max(0));
            }
        }
        Ok(true)
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.tables.comments.get(&id).map(|c| c.value().clone()))
    }

    async fn list_comments(&self, query: &CommentQuery) -> anyhow::Result<Vec<CommentView>> {
        let mut comments: Vec<Comment> = self
            .tables
            .comments
            .iter()
            .filter(|c| query.post_id.map_or(true, |p| c.post_id == p))
            .filter(|c| query.author_id.map_or(true, |a| c.author_id == a))
            .map(|c| c.value().clone())
            .collect();

        comments.sort_by_key(|c| (c.created_at, c.id));
        if query.order == CommentOrder::Newest {
            comments.reverse();
        }
        if let Some(limit) = query.limit {
            comments.truncate(limit.max(0) as usize);
        }

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                author: self.author(comment.author_id),
                comment,
            })
            .collect())
    }
}

#[async_trait]
impl VoteService<anyhow::Error> for MemoryStore {
    async fn find_vote(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Vote>> {
        Ok(self.tables.votes.get(&(post_id, user_id)).map(|v| v.value().clone()))
    }

    async fn upsert_vote(&self, v: &Vote) -> anyhow::Result<Vote> {
        if !self.tables.posts.contains_key(&v.post_id) {
            bail!("insert on votes violates foreign key: post {}", v.post_id);
        }
        if let Some(old) = self.tables.votes.insert((v.post_id, v.user_id), v.clone()) {
            self.adjust_votes(old.post_id, old.vote_type, -1);
        }
        self.adjust_votes(v.post_id, v.vote_type, 1);
        Ok(v.clone())
    }

    async fn delete_vote(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        match self.tables.votes.remove(&(post_id, user_id)) {
            Some((_, old)) => {
                self.adjust_votes(post_id, old.vote_type, -1);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl GroupService<anyhow::Error> for MemoryStore {
    async fn insert_group(&self, g: &CreateGroup) -> anyhow::Result<Group> {
        check_width(&g.name, NAME_MAX)?;
        let id = Uuid::now_v7();
        claim(&self.tables.group_names, &g.name, id, "groups_name_key")?;
        let group = Group {
            id,
            name: g.name.clone(),
            description: g.description.clone(),
            image_url: g.image_url.clone(),
            member_count: 0,
            created_by: g.created_by,
            created_at: now(),
        };
        self.tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: Uuid) -> anyhow::Result<Option<Group>> {
        Ok(self.tables.groups.get(&id).map(|g| g.value().clone()))
    }

    async fn find_group_by_name(&self, name: &str) -> anyhow::Result<Option<Group>> {
        let id = match self.tables.group_names.get(name) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.tables.groups.get(&id).map(|g| g.value().clone()))
    }

    async fn delete_group(&self, id: Uuid) -> anyhow::Result<bool> {
        let Some((_, group)) = self.tables.groups.remove(&id) else {
            return Ok(false);
        };
        self.tables.group_names.remove_if(&group.name, |_, owner| *owner == id);
        self.tables.members.retain(|(group_id, _), _| *group_id != id);
        Ok(true)
    }

    async fn list_groups(&self, query: &GroupQuery) -> anyhow::Result<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .tables
            .groups
            .iter()
            .filter(|g| query.min_members.map_or(true, |m| g.member_count >= m))
            .map(|g| g.value().clone())
            .collect();

        match query.order {
            GroupOrder::MemberCount => groups.sort_by(|a, b| {
                b.member_count
                    .cmp(&a.member_count)
                    .then_with(|| a.name.cmp(&b.name))
            }),
            GroupOrder::Name => groups.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        if let Some(limit) = query.limit {
            groups.truncate(limit.max(0) as usize);
        }

        Ok(groups)
    }

    async fn insert_membership(&self, join: &JoinGroup) -> anyhow::Result<GroupMember> {
        let key = (join.group_id, join.user_id);
        if self.tables.members.contains_key(&key) {
            bail!("duplicate key value violates unique constraint \"group_members_pkey\"");
        }
        let mut group = self
            .tables
            .groups
            .get_mut(&join.group_id)
            .ok_or_else(|| anyhow!("insert on group_members violates foreign key: group {}", join.group_id))?;
        let member = GroupMember {
            group_id: join.group_id,
            user_id: join.user_id,
            joined_at: now(),
        };
        self.tables.members.insert(key, member.clone());
        group.member_count += 1;
        Ok(member)
    }

    async fn delete_membership(&self, group_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        if self.tables.members.remove(&(group_id, user_id)).is_none() {
            return Ok(false);
        }
        if let Some(mut group) = self.tables.groups.get_mut(&group_id) {
            group.member_count = (group.member_count - 1).max(0);
        }
        Ok(true)
    }

    async fn memberships(&self, user_id: Uuid) -> anyhow::Result<Vec<GroupMember>> {
        Ok(self
            .tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.value().clone())
            .collect())
    }
}

#[async_trait]
impl ProfileService<anyhow::Error> for MemoryStore {
    async fn insert_profile(&self, p: &CreateProfile) -> anyhow::Result<Profile> {
        check_width(&p.username, USERNAME_MAX)?;
        claim(&self.tables.usernames, &p.username, p.user_id, "profiles_username_key")?;
        let slot = match self.tables.profiles.entry(p.user_id) {
            Entry::Occupied(existing) => {
                if existing.get().username != p.username {
                    self.tables.usernames.remove_if(&p.username, |_, owner| *owner == p.user_id);
                }
                bail!("duplicate key value violates unique constraint \"profiles_pkey\"");
            }
            Entry::Vacant(slot) => slot,
        };
        let profile = Profile {
            user_id: p.user_id,
            username: p.username.clone(),
            display_name: p.display_name.clone(),
            bio: None,
            avatar_url: None,
            created_at: now(),
        };
        slot.insert(profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        Ok(self.tables.profiles.get(&user_id).map(|p| p.value().clone()))
    }

    async fn find_profile_by_username(&self, username: &str) -> anyhow::Result<Option<Profile>> {
        let user_id = match self.tables.usernames.get(username) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.tables.profiles.get(&user_id).map(|p| p.value().clone()))
    }

    async fn update_profile(&self, user_id: Uuid, patch: &UpdateProfile) -> anyhow::Result<Profile> {
        if !self.tables.profiles.contains_key(&user_id) {
            bail!("no profile for {user_id}");
        }
        if let Some(username) = &patch.username {
            check_width(username, USERNAME_MAX)?;
            claim(&self.tables.usernames, username, user_id, "profiles_username_key")?;
        }
        let mut profile = self
            .tables
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| anyhow!("no profile for {user_id}"))?;
        if let Some(v) = &patch.username {
            if profile.username != *v {
                self.tables.usernames.remove_if(&profile.username, |_, owner| *owner == user_id);
                profile.username = v.clone();
            }
        }
        if let Some(v) = &patch.display_name {
            profile.display_name = Some(v.clone());
        }
        if let Some(v) = &patch.bio {
            profile.bio = Some(v.clone());
        }
        if let Some(v) = &patch.avatar_url {
            profile.avatar_url = Some(v.clone());
        }
        Ok(profile.clone())
    }
}
