use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::models::author::Author;
use crate::models::post::*;
use crate::schema::{groups, posts, profiles};

use super::{ForumServiceDb, Svc};

#[async_trait]
pub trait PostService<E = anyhow::Error>: Svc {
    async fn insert_post(&self, post: &CreatePost) -> Result<Post, E>;
    async fn update_post(&self, id: Uuid, patch: &UpdatePost) -> Result<Post, E>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, E>;
    async fn get_post(&self, id: Uuid) -> Result<Option<PostView>, E>;
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostView>, E>;
}

type PostRow = (
    Post,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn into_view((post, group_name, username, display_name, avatar_url): PostRow) -> PostView {
    PostView {
        post,
        author: Author::from_joined(username, display_name, avatar_url),
        group_name,
    }
}

#[async_trait]
impl PostService<anyhow::Error> for ForumServiceDb {
    async fn insert_post(&self, p: &CreatePost) -> anyhow::Result<Post> {
        let mut conn = self.db.get().await?;

        let post = diesel::insert_into(posts::table)
            .values(p)
            .get_result::<Post>(&mut conn)
            .await?;

        Ok(post)
    }

    async fn update_post(&self, id: Uuid, patch: &UpdatePost) -> anyhow::Result<Post> {
        let mut conn = self.db.get().await?;

        let post = diesel::update(posts::table.find(id))
            .set(patch)
            .get_result::<Post>(&mut conn)
            .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let n = diesel::delete(posts::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(n > 0)
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostView>> {
        let mut conn = self.db.get().await?;

        let row = posts::table
            .left_join(groups::table)
            .left_join(profiles::table)
            .filter(posts::id.eq(id))
            .select((
                Post::as_select(),
                groups::name.nullable(),
                profiles::username.nullable(),
                profiles::display_name.nullable(),
                profiles::avatar_url.nullable(),
            ))
            .first::<PostRow>(&mut conn)
            .await
            .optional()?;

        Ok(row.map(into_view))
    }

    async fn list_posts(&self, query: &PostQuery) -> anyhow::Result<Vec<PostView>> {
        let mut conn = self.db.get().await?;

        let mut q = posts::table
            .left_join(groups::table)
            .left_join(profiles::table)
            .select((
                Post::as_select(),
                groups::name.nullable(),
                profiles::username.nullable(),
                profiles::display_name.nullable(),
                profiles::avatar_url.nullable(),
            ))
            .into_boxed();

        if let Some(author) = query.author_id {
            q = q.filter(posts::author_id.eq(author));
        }
        if let Some(group) = query.group_id {
            q = q.filter(posts::group_id.eq(group));
        }
        q = match query.order {
            PostOrder::Newest => q.order(posts::created_at.desc()),
            PostOrder::MostUpvoted => q.order((posts::upvotes.desc(), posts::created_at.desc())),
        };
        if let Some(limit) = query.limit {
            q = q.limit(limit);
        }

        let rows = q.load::<PostRow>(&mut conn).await?;
        Ok(rows.into_iter().map(into_view).collect())
    }
}
