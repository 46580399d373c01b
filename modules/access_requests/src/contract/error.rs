use thiserror::Error;

use crate::contract::model::Identity;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Not authorized")]
    NotAuthorized,

    #[error("User not found: {user_id}")]
    NotFound { user_id: Identity },

    #[error("User {user_id} has not been granted access")]
    NotApproved { user_id: Identity },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl AccessError {
    pub fn not_authorized() -> Self {
        Self::NotAuthorized
    }

    pub fn not_found(user_id: Identity) -> Self {
        Self::NotFound { user_id }
    }

    pub fn not_approved(user_id: Identity) -> Self {
        Self::NotApproved { user_id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
