use chrono::{DateTime, Utc};

use crate::contract::model::Identity;

/// Transport-agnostic domain event, published after the transition commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessEvent {
    /// A new or renewed request is waiting for the admin.
    Submitted { target: Identity, at: DateTime<Utc> },
    Approved { target: Identity, at: DateTime<Utc> },
    Rejected { target: Identity, at: DateTime<Utc> },
}

impl AccessEvent {
    pub fn target(&self) -> Identity {
        match self {
            Self::Submitted { target, .. }
            | Self::Approved { target, .. }
            | Self::Rejected { target, .. } => *target,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Submitted { at, .. } | Self::Approved { at, .. } | Self::Rejected { at, .. } => {
                *at
            }
        }
    }
}
