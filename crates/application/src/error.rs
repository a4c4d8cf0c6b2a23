//! Application error types

use forcenpm_domain::DomainError;
use thiserror::Error;

use crate::ports::BackendError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A background task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
