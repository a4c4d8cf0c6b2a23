//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A required session value is missing or empty.
    #[error("missing session value: {0}")]
    MissingSessionValue(&'static str),

    /// The mode string is not recognised.
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
