//! Forum operations on top of the record store.
//!
//! Everything that needs identity takes a [`Viewer`] explicitly; nothing here
//! reads ambient session state.

pub mod comments;
pub mod dashboard;
pub mod groups;
pub mod posts;
pub mod profiles;
pub mod trending;
pub mod votes;

use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Who is performing an action, as established by the auth gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<Uuid>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn require(&self) -> ServiceResult<Uuid> {
        self.user_id
            .ok_or_else(|| ServiceError::forbidden("sign in required"))
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }

    /// Fails unless the viewer is `owner`.
    pub fn require_owner(&self, owner: Uuid, what: &str) -> ServiceResult<Uuid> {
        let me = self.require()?;
        if me != owner {
            return Err(ServiceError::forbidden(format!("only the author can modify this {what}")));
        }
        Ok(me)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_checks() {
        let owner = Uuid::now_v7();
        assert!(Viewer::user(owner).require_owner(owner, "post").is_ok());
        assert!(matches!(
            Viewer::user(Uuid::now_v7()).require_owner(owner, "post"),
            Err(ServiceError::Authorization(_))
        ));
        assert!(matches!(
            Viewer::anonymous().require(),
            Err(ServiceError::Authorization(_))
        ));
    }
}
