use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::post::Post;
use crate::models::vote::{Vote, VoteDirection};
use crate::services::votes::VoteService;

use super::Viewer;

/// What the vote controls show for one viewer. Changes only on a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum VoteState {
    #[default]
    Unvoted,
    Upvoted,
    Downvoted,
}

impl VoteState {
    pub fn direction(self) -> Option<VoteDirection> {
        match self {
            VoteState::Unvoted => None,
            VoteState::Upvoted => Some(VoteDirection::Up),
            VoteState::Downvoted => Some(VoteDirection::Down),
        }
    }
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(d: Option<VoteDirection>) -> Self {
        match d {
            None => VoteState::Unvoted,
            Some(VoteDirection::Up) => VoteState::Upvoted,
            Some(VoteDirection::Down) => VoteState::Downvoted,
        }
    }
}

/// The single store write a vote click results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteWrite {
    Upsert(VoteDirection),
    Retract,
}

/// Counters of one post plus the viewer's own vote on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VoteTally {
    pub upvotes: i32,
    pub downvotes: i32,
    pub state: VoteState,
}

impl VoteTally {
    pub fn new(upvotes: i32, downvotes: i32, state: VoteState) -> Self {
        Self {
            upvotes,
            downvotes,
            state,
        }
    }

    pub fn of(post: &Post, own_vote: Option<&Vote>) -> Self {
        Self::new(
            post.upvotes,
            post.downvotes,
            own_vote.and_then(Vote::direction).into(),
        )
    }

    pub fn net_score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    fn counter(&mut self, d: VoteDirection) -> &mut i32 {
        match d {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        }
    }

    /// Tally after clicking `action`, and the write that persists it.
    ///
    /// Clicking the current direction again retracts; counters never drop
    /// below zero.
    pub fn apply(self, action: VoteDirection) -> (VoteTally, VoteWrite) {
        let mut next = self;
        match self.state.direction() {
            Some(current) if current == action => {
                let c = next.counter(action);
                *c = (*c - 1).max(0);
                next.state = VoteState::Unvoted;
                (next, VoteWrite::Retract)
            }
            prior => {
                if let Some(prior) = prior {
                    let c = next.counter(prior);
                    *c = (*c - 1).max(0);
                }
                *next.counter(action) += 1;
                next.state = Some(action).into();
                (next, VoteWrite::Upsert(action))
            }
        }
    }
}

/// A vote that didn't persist. `rollback` is the tally from before the click.
#[derive(Debug)]
pub struct VoteRejected {
    pub rollback: VoteTally,
    pub error: ServiceError,
}

/// Apply `action` optimistically and persist it with exactly one upsert or
/// delete. On failure the caller gets the pre-click tally back; no retry.
#[tracing::instrument(skip(store, viewer, before), fields(viewer = ?viewer.user_id))]
pub async fn cast_vote<V: VoteService>(
    store: &V,
    viewer: &Viewer,
    post_id: Uuid,
    before: VoteTally,
    action: VoteDirection,
) -> Result<VoteTally, VoteRejected> {
    let reject = |error| VoteRejected {
        rollback: before,
        error,
    };
    let user_id = viewer.require().map_err(reject)?;

    let (after, write) = before.apply(action);
    let persisted = match write {
        VoteWrite::Upsert(d) => store
            .upsert_vote(&Vote::new(post_id, user_id, d))
            .await
            .map(|_| ()),
        VoteWrite::Retract => store.delete_vote(post_id, user_id).await.map(|_| ()),
    };

    match persisted {
        Ok(()) => Ok(after),
        Err(e) => {
            tracing::warn!(error = %e, %post_id, "vote not saved, rolling back");
            Err(reject(ServiceError::Persistence(e)))
        }
    }
}

/// Current tally for `post` as seen by `viewer`.
pub async fn tally_for<V: VoteService>(
    store: &V,
    viewer: &Viewer,
    post: &Post,
) -> ServiceResult<VoteTally> {
    let own = match viewer.user_id {
        Some(user_id) => store.find_vote(post.id, user_id).await?,
        None => None,
    };
    Ok(VoteTally::of(post, own.as_ref()))
}
