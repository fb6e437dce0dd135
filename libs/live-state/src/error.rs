use thiserror::Error;

/// Failure delivered to view subscribers in place of a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("upstream delivery failed: {message}")]
    Upstream { message: String },

    #[error("view '{view}' failed to derive: {message}")]
    Derivation { view: String, message: String },
}

impl ViewError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn derivation(view: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Derivation {
            view: view.into(),
            message: message.into(),
        }
    }
}

/// What a live source hands to its listeners.
pub type Delivery<T> = Result<T, ViewError>;
