use thiserror::Error;

use crate::contract::model::Identity;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Actor {actor} is not authorized for this operation")]
    NotAuthorized { actor: Identity },

    #[error("User not found: {user_id}")]
    NotFound { user_id: Identity },

    #[error("User {user_id} has not been granted access")]
    NotApproved { user_id: Identity },

    #[error("Validation failed: {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Failed to launch download: {message}")]
    Launch { message: String },
}

impl DomainError {
    pub fn not_authorized(actor: Identity) -> Self {
        Self::NotAuthorized { actor }
    }

    pub fn not_found(user_id: Identity) -> Self {
        Self::NotFound { user_id }
    }

    pub fn not_approved(user_id: Identity) -> Self {
        Self::NotApproved { user_id }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }
}

impl From<DomainError> for crate::contract::error::AccessError {
    fn from(e: DomainError) -> Self {
        use crate::contract::error::AccessError;
        match e {
            DomainError::NotAuthorized { .. } => AccessError::not_authorized(),
            DomainError::NotFound { user_id } => AccessError::not_found(user_id),
            DomainError::NotApproved { user_id } => AccessError::not_approved(user_id),
            DomainError::InvalidInput { field, message } => {
                AccessError::validation(format!("{field}: {message}"))
            }
            DomainError::Storage { .. } | DomainError::Launch { .. } => AccessError::internal(),
        }
    }
}
