use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::contract::model::Identity;

/// Button payloads, decoded once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    ListRequests,
    Approve(Identity),
    Reject(Identity),
    PrevPage,
    NextPage,
    RequestAccess,
    Download,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackParseError {
    #[error("unknown callback '{0}'")]
    Unknown(String),
    #[error("invalid user id in callback '{data}': {reason}")]
    InvalidIdentity { data: String, reason: String },
}

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let target = |raw: &str| {
            raw.parse::<Identity>()
                .map_err(|reason| CallbackParseError::InvalidIdentity {
                    data: data.to_owned(),
                    reason,
                })
        };

        match data.split(':').collect::<Vec<_>>().as_slice() {
            ["admin", "list_requests"] => Ok(Self::ListRequests),
            ["admin", "approve", id] => target(id).map(Self::Approve),
            ["admin", "reject", id] => target(id).map(Self::Reject),
            ["admin", "prev_page"] => Ok(Self::PrevPage),
            ["admin", "next_page"] => Ok(Self::NextPage),
            ["user", "request_access"] => Ok(Self::RequestAccess),
            ["user", "download"] => Ok(Self::Download),
            _ => Err(CallbackParseError::Unknown(data.to_owned())),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListRequests => f.write_str("admin:list_requests"),
            Self::Approve(id) => write!(f, "admin:approve:{id}"),
            Self::Reject(id) => write!(f, "admin:reject:{id}"),
            Self::PrevPage => f.write_str("admin:prev_page"),
            Self::NextPage => f.write_str("admin:next_page"),
            Self::RequestAccess => f.write_str("user:request_access"),
            Self::Download => f.write_str("user:download"),
        }
    }
}

impl CallbackAction {
    pub fn is_admin_action(&self) -> bool {
        !matches!(self, Self::RequestAccess | Self::Download)
    }
}
