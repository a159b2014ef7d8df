use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored value of a vote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i16 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn from_value(v: i16) -> Option<Self> {
        match v {
            1 => Some(VoteDirection::Up),
            -1 => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

/// One row per (post, user); replaced on change, removed on retract.
#[derive(Serialize, Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Vote {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub vote_type: i16,
}

impl Vote {
    pub fn new(post_id: Uuid, user_id: Uuid, direction: VoteDirection) -> Self {
        Self {
            post_id,
            user_id,
            vote_type: direction.value(),
        }
    }

    pub fn direction(&self) -> Option<VoteDirection> {
        VoteDirection::from_value(self.vote_type)
    }
}
