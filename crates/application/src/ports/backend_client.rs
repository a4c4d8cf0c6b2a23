//! Backend client port

use std::future::Future;

use forcenpm_domain::{
    CreatedResource, ErrorKind, FileReference, ForceNpmRecord, PackageSuggestion,
    PackageVersionList, UserOrgInfo,
};
use thiserror::Error;

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error type for backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend rejected the session tokens.
    #[error("unauthorized ({status}): {message}")]
    Unauthorized {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The backend answered with another non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request never reached the backend or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// No answer within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The response body was not the expected JSON.
    #[error("malformed response: {0}")]
    MalformedBody(String),

    /// The client could not be built from the session configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Classifies a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            _ => Self::Status { status, message },
        }
    }

    /// Converts this error to an [`ErrorKind`] for UI display.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Status { .. } => ErrorKind::Server,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::MalformedBody(_) => ErrorKind::MalformedBody,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Returns true when the session needs new tokens.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Port for the force-npm backend.
///
/// One method per backend capability. Implementations attach the session
/// headers to every call and never retry.
pub trait ForceNpmBackend: Send + Sync {
    /// `GET /force/userinfo`
    fn fetch_user_info(&self) -> impl Future<Output = BackendResult<UserOrgInfo>> + Send;

    /// `GET /force/npm`
    fn list_provisioned_resources(
        &self,
    ) -> impl Future<Output = BackendResult<Vec<ForceNpmRecord>>> + Send;

    /// `GET /npm/search?query=...`
    fn search_packages(
        &self,
        query: &str,
    ) -> impl Future<Output = BackendResult<Vec<PackageSuggestion>>> + Send;

    /// `GET /npm/versions?name=...`
    fn list_package_versions(
        &self,
        name: &str,
    ) -> impl Future<Output = BackendResult<PackageVersionList>> + Send;

    /// `POST /force/npm?name=...&version=...`
    fn create_provisioned_resource(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = BackendResult<CreatedResource>> + Send;

    /// `GET /npm/files?name=...&version=...`
    ///
    /// The `version` parameter is omitted when `None`.
    fn list_file_references(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> impl Future<Output = BackendResult<Vec<FileReference>>> + Send;
}
