use axum::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::models::vote::Vote;
use crate::schema::votes;

use super::{ForumServiceDb, Svc};

#[async_trait]
pub trait VoteService<E = anyhow::Error>: Svc {
    async fn find_vote(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Vote>, E>;
    /// Insert, or replace the value of, the (post, user) row.
    async fn upsert_vote(&self, vote: &Vote) -> Result<Vote, E>;
    async fn delete_vote(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, E>;
}

#[async_trait]
impl VoteService<anyhow::Error> for ForumServiceDb {
    async fn find_vote(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Vote>> {
        let mut conn = self.db.get().await?;

        let vote = votes::table
            .find((post_id, user_id))
            .select(Vote::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(vote)
    }

    async fn upsert_vote(&self, v: &Vote) -> anyhow::Result<Vote> {
        let mut conn = self.db.get().await?;

        let vote = diesel::insert_into(votes::table)
            .values(v)
            .on_conflict((votes::post_id, votes::user_id))
            .do_update()
            .set(votes::vote_type.eq(excluded(votes::vote_type)))
            .get_result::<Vote>(&mut conn)
            .await?;

        Ok(vote)
    }

    async fn delete_vote(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let n = diesel::delete(votes::table.find((post_id, user_id)))
            .execute(&mut conn)
            .await?;

        Ok(n > 0)
    }
}
