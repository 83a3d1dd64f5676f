use thiserror::Error;

/// Failure of a domain operation.
///
/// The HTTP layer maps each variant onto a status code; `Backend` carries
/// persistence failures that are never shown to clients verbatim.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
