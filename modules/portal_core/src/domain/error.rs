use thiserror::Error;

use crate::contract::model::{Collection, InvalidRecordId, RecordId};
use crate::domain::repo::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid argument: {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: RecordId },

    #[error("{collection} record already exists: {id}")]
    Conflict { collection: Collection, id: RecordId },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_id(field: &str, err: InvalidRecordId) -> Self {
        Self::invalid_argument(field, err.to_string())
    }

    pub fn not_found(collection: Collection, id: RecordId) -> Self {
        Self::NotFound { collection, id }
    }

    pub fn conflict(collection: Collection, id: RecordId) -> Self {
        Self::Conflict { collection, id }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } => Self::not_found(collection, id),
            StoreError::Duplicate { collection, id } => Self::conflict(collection, id),
            StoreError::Unavailable { message } => Self::store_unavailable(message),
        }
    }
}
