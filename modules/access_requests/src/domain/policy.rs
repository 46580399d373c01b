use crate::contract::model::{Identity, UserStatus};
use crate::domain::error::DomainError;

/// Who may do what. Pure, no I/O.
///
/// The admin is a single configured identity compared against the sender of
/// each event.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    admin: Identity,
}

impl AccessPolicy {
    pub fn new(admin: Identity) -> Self {
        Self { admin }
    }

    pub fn admin(&self) -> Identity {
        self.admin
    }

    pub fn is_admin(&self, identity: Identity) -> bool {
        identity == self.admin
    }

    pub fn authorize_admin(&self, identity: Identity) -> Result<(), DomainError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(DomainError::not_authorized(identity))
        }
    }

    /// Only approved users may download.
    pub fn can_download(&self, status: Option<UserStatus>) -> bool {
        matches!(status, Some(UserStatus::Approved))
    }

    /// Users may look at their own record; the admin may look at anyone's.
    pub fn authorize_view(&self, actor: Identity, target: Identity) -> Result<(), DomainError> {
        if actor == target || self.is_admin(actor) {
            Ok(())
        } else {
            Err(DomainError::not_authorized(actor))
        }
    }
}
