use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Chat identity of a user (the sender's user id on the chat platform).
///
/// Valid identities are strictly positive; group/channel ids are not users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub i64);

impl Identity {
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identity {
    fn from(value: i64) -> Self {
        Identity(value)
    }
}

/// Parses a decimal identity. Non-numeric and non-positive values are rejected.
impl FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a numeric identity"))?;
        let identity = Identity(id);
        if identity.is_valid() {
            Ok(identity)
        } else {
            Err(format!("identity must be positive, got {id}"))
        }
    }
}

/// Status of a user that has a record.
///
/// The persisted form is a pair of flags `(approved, pending)`; the combination
/// where both are set is not representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserStatus {
    /// Known user, neither approved nor waiting (fresh record or rejected).
    Inactive,
    /// Waiting for an admin decision.
    Pending,
    /// Granted access.
    Approved,
}

impl UserStatus {
    pub fn approved(self) -> bool {
        matches!(self, UserStatus::Approved)
    }

    pub fn pending(self) -> bool {
        matches!(self, UserStatus::Pending)
    }

    /// Build from stored flags. Returns `None` for `approved && pending`.
    pub fn from_flags(approved: bool, pending: bool) -> Option<Self> {
        match (approved, pending) {
            (false, false) => Some(UserStatus::Inactive),
            (false, true) => Some(UserStatus::Pending),
            (true, false) => Some(UserStatus::Approved),
            (true, true) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Inactive => "inactive",
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current record of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: Identity,
    pub status: UserStatus,
    /// When the current status took effect.
    pub status_since: DateTime<Utc>,
}

/// A snapshot of the status a user held before a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Monotonically increasing across the whole store.
    pub sequence_id: i64,
    pub user_id: Identity,
    /// Status the user held before the change.
    pub previous: UserStatus,
    /// When the previous status took effect.
    pub previous_since: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

/// One page of pending identities, oldest request first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPage {
    pub items: Vec<Identity>,
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PendingPage {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Result of a user asking for access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new request was recorded and now awaits review.
    Submitted,
    AlreadyPending,
    AlreadyApproved,
}

/// Result of an admin decision (approve or reject).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The pending request was resolved to `status`.
    Applied { status: UserStatus },
    /// The target was not pending; nothing was written.
    Unchanged { current: UserStatus },
}

/// Inputs the lifecycle manager reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Register { identity: Identity },
    AdminApprove { identity: Identity, target: Identity },
    AdminReject { identity: Identity, target: Identity },
    AdminListPending { identity: Identity, page: u64 },
}

/// What handling an [`InboundEvent`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Registered(RegisterOutcome),
    Decided { target: Identity, decision: Decision },
    Pending(PendingPage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_roundtrip_and_reject_invalid_combination() {
        for status in [UserStatus::Inactive, UserStatus::Pending, UserStatus::Approved] {
            assert_eq!(
                UserStatus::from_flags(status.approved(), status.pending()),
                Some(status)
            );
        }
        assert_eq!(UserStatus::from_flags(true, true), None);
    }

    #[test]
    fn identity_parsing() {
        assert_eq!("42".parse::<Identity>(), Ok(Identity(42)));
        assert_eq!(" 7 ".parse::<Identity>(), Ok(Identity(7)));
        assert!("0".parse::<Identity>().is_err());
        assert!("-5".parse::<Identity>().is_err());
        assert!("abc".parse::<Identity>().is_err());
    }

    #[test]
    fn page_navigation_flags() {
        let page = PendingPage {
            items: vec![Identity(1)],
            page: 2,
            page_size: 1,
            total_count: 3,
            total_pages: 3,
        };
        assert!(page.has_prev());
        assert!(page.has_next());

        let last = PendingPage { page: 3, ..page };
        assert!(!last.has_next());
    }
}
