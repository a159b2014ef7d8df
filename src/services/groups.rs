use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::models::group::*;
use crate::schema::{group_members, groups};

use super::{ForumServiceDb, Svc};

#[async_trait]
pub trait GroupService<E = anyhow::Error>: Svc {
    async fn insert_group(&self, group: &CreateGroup) -> Result<Group, E>;
    async fn get_group(&self, id: Uuid) -> Result<Option<Group>, E>;
    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, E>;
    async fn list_groups(&self, query: &GroupQuery) -> Result<Vec<Group>, E>;
    async fn delete_group(&self, id: Uuid) -> Result<bool, E>;
    async fn insert_membership(&self, join: &JoinGroup) -> Result<GroupMember, E>;
    async fn delete_membership(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, E>;
    async fn memberships(&self, user_id: Uuid) -> Result<Vec<GroupMember>, E>;
}

#[async_trait]
impl GroupService<anyhow::Error> for ForumServiceDb {
    async fn insert_group(&self, g: &CreateGroup) -> anyhow::Result<Group> {
        let mut conn = self.db.get().await?;

        let group = diesel::insert_into(groups::table)
            .values(g)
            .get_result::<Group>(&mut conn)
            .await?;

        Ok(group)
    }

    async fn get_group(&self, id: Uuid) -> anyhow::Result<Option<Group>> {
        let mut conn = self.db.get().await?;

        let group = groups::table
            .find(id)
            .select(Group::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(group)
    }

    async fn find_group_by_name(&self, name: &str) -> anyhow::Result<Option<Group>> {
        let mut conn = self.db.get().await?;

        let group = groups::table
            .filter(groups::name.eq(name))
            .select(Group::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(group)
    }

    async fn list_groups(&self, query: &GroupQuery) -> anyhow::Result<Vec<Group>> {
        let mut conn = self.db.get().await?;

        let mut q = groups::table.select(Group::as_select()).into_boxed();
        if let Some(min) = query.min_members {
            q = q.filter(groups::member_count.ge(min));
        }
        q = match query.order {
            GroupOrder::MemberCount => q.order((groups::member_count.desc(), groups::name.asc())),
            GroupOrder::Name => q.order(groups::name.asc()),
        };
        if let Some(limit) = query.limit {
            q = q.limit(limit);
        }

        Ok(q.load(&mut conn).await?)
    }

    async fn delete_group(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let n = diesel::delete(groups::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(n > 0)
    }

    async fn insert_membership(&self, join: &JoinGroup) -> anyhow::Result<GroupMember> {
        let mut conn = self.db.get().await?;

        let member = diesel::insert_into(group_members::table)
            .values(join)
            .get_result::<GroupMember>(&mut conn)
            .await?;

        Ok(member)
    }

    async fn delete_membership(&self, group_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let n = diesel::delete(group_members::table.find((group_id, user_id)))
            .execute(&mut conn)
            .await?;

        Ok(n > 0)
    }

    async fn memberships(&self, user_id: Uuid) -> anyhow::Result<Vec<GroupMember>> {
        let mut conn = self.db.get().await?;

        let members = group_members::table
            .filter(group_members::user_id.eq(user_id))
            .select(GroupMember::as_select())
            .load(&mut conn)
            .await?;

        Ok(members)
    }
}
