use thiserror::Error;

use crate::contract::model::{Collection, RecordId};

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: RecordId },

    #[error("{collection} record already exists: {id}")]
    Conflict { collection: Collection, id: RecordId },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Store unavailable")]
    Unavailable,
}

impl PortalError {
    pub fn not_found(collection: Collection, id: RecordId) -> Self {
        Self::NotFound { collection, id }
    }

    pub fn conflict(collection: Collection, id: RecordId) -> Self {
        Self::Conflict { collection, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self::Unavailable
    }
}

impl From<crate::domain::error::DomainError> for PortalError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            InvalidArgument { field, message } => Self::validation(format!("{field}: {message}")),
            NotFound { collection, id } => Self::not_found(collection, id),
            Conflict { collection, id } => Self::conflict(collection, id),
            StoreUnavailable { .. } => Self::unavailable(),
        }
    }
}
