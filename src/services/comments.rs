use axum::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::models::author::Author;
use crate::models::comment::*;
use crate::schema::{comments, profiles};

use super::{ForumServiceDb, Svc};

#[async_trait]
pub trait CommentService<E = anyhow::Error>: Svc {
    async fn insert_comment(&self, comment: &CreateComment) -> Result<Comment, E>;
    async fn update_comment(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Comment, E>;
    /// Replies of a deleted comment go with it.
    async fn delete_comment(&self, id: Uuid) -> Result<bool, E>;
    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>, E>;
    async fn list_comments(&self, query: &CommentQuery) -> Result<Vec<CommentView>, E>;
}

type CommentRow = (Comment, Option<String>, Option<String>, Option<String>);

#[async_trait]
impl CommentService<anyhow::Error> for ForumServiceDb {
    async fn insert_comment(&self, c: &CreateComment) -> anyhow::Result<Comment> {
        let mut conn = self.db.get().await?;

        let comment = diesel::insert_into(comments::table)
            .values(c)
            .get_result::<Comment>(&mut conn)
            .await?;

        Ok(comment)
    }

    async fn update_comment(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Comment> {
        let mut conn = self.db.get().await?;

        let comment = diesel::update(comments::table.find(id))
            .set((
                comments::content.eq(content),
                comments::updated_at.eq(updated_at),
            ))
            .get_result::<Comment>(&mut conn)
            .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let n = diesel::delete(comments::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(n > 0)
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let mut conn = self.db.get().await?;

        let comment = comments::table
            .find(id)
            .select(Comment::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(comment)
    }

    async fn list_comments(&self, query: &CommentQuery) -> anyhow::Result<Vec<CommentView>> {
        let mut conn = self.db.get().await?;

        let mut q = comments::table
            .left_join(profiles::table)
            .select((
                Comment::as_select(),
                profiles::username.nullable(),
                profiles::display_name.nullable(),
                profiles::avatar_url.nullable(),
            ))
            .into_boxed();

        if let Some(post) = query.post_id {
            q = q.filter(comments::post_id.eq(post));
        }
        if let Some(author) = query.author_id {
            q = q.filter(comments::author_id.eq(author));
        }
        q = match query.order {
            CommentOrder::Oldest => q.order(comments::created_at.asc()),
            CommentOrder::Newest => q.order(comments::created_at.desc()),
        };
        if let Some(limit) = query.limit {
            q = q.limit(limit);
        }

        let rows = q.load::<CommentRow>(&mut conn).await?;
        Ok(rows
            .into_iter()
            .map(|(comment, username, display_name, avatar_url)| CommentView {
                comment,
                author: Author::from_joined(username, display_name, avatar_url),
            })
            .collect())
    }
}
