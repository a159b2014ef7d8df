use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::models::profile::*;
use crate::schema::profiles;

use super::{ForumServiceDb, Svc};

#[async_trait]
pub trait ProfileService<E = anyhow::Error>: Svc {
    async fn insert_profile(&self, profile: &CreateProfile) -> Result<Profile, E>;
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, E>;
    async fn find_profile_by_username(&self, username: &str) -> Result<Option<Profile>, E>;
    async fn update_profile(&self, user_id: Uuid, patch: &UpdateProfile) -> Result<Profile, E>;
}

#[async_trait]
impl ProfileService<anyhow::Error> for ForumServiceDb {
    async fn insert_profile(&self, p: &CreateProfile) -> anyhow::Result<Profile> {
        let mut conn = self.db.get().await?;

        let profile = diesel::insert_into(profiles::table)
            .values(p)
            .get_result::<Profile>(&mut conn)
            .await?;

        Ok(profile)
    }

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let mut conn = self.db.get().await?;

        let profile = profiles::table
            .find(user_id)
            .select(Profile::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(profile)
    }

    async fn find_profile_by_username(&self, username: &str) -> anyhow::Result<Option<Profile>> {
        let mut conn = self.db.get().await?;

        let profile = profiles::table
            .filter(profiles::username.eq(username))
            .select(Profile::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(profile)
    }

    async fn update_profile(&self, user_id: Uuid, patch: &UpdateProfile) -> anyhow::Result<Profile> {
        let mut conn = self.db.get().await?;

        let profile = diesel::update(profiles::table.find(user_id))
            .set(patch)
            .get_result::<Profile>(&mut conn)
            .await?;

        Ok(profile)
    }
}
