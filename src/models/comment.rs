use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::author::Author;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Shown as "(edited)".
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Author,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentOrder {
    #[default]
    Oldest,
    Newest,
}

#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub post_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub order: CommentOrder,
    pub limit: Option<i64>,
}

impl CommentQuery {
    pub fn for_post(post_id: Uuid) -> Self {
        Self {
            post_id: Some(post_id),
            ..Default::default()
        }
    }
}
