use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// Column width of `groups.name`, in characters.
pub const NAME_MAX: usize = 64;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateGroup {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub created_by: Uuid,
}

#[derive(Serialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub member_count: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Case-insensitive substring match on name or description.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = crate::schema::group_members)]
pub struct JoinGroup {
    pub group_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Serialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::group_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    #[default]
    MemberCount,
    Name,
}

#[derive(Debug, Clone, Default)]
pub struct GroupQuery {
    pub min_members: Option<i32>,
    pub order: GroupOrder,
    pub limit: Option<i64>,
}

impl GroupQuery {
    /// Groups with at least one member, largest first.
    pub fn popular(limit: i64) -> Self {
        Self {
            min_members: Some(1),
            order: GroupOrder::MemberCount,
            limit: Some(limit),
        }
    }
}
