//! Load state of each view slice for UI binding.
//!
//! Every piece of data the client shows is fetched independently. Each one
//! carries a [`SliceStatus`] so the front end can show a spinner or an
//! error next to it instead of failing silently.

use serde::{Deserialize, Serialize};

/// Represents the current state of one slice of the view.
///
/// - `Idle`: nothing requested yet
/// - `Loading`: request in flight
/// - `Loaded`: last request succeeded
/// - `Failed`: last request failed, prior data kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SliceStatus {
    /// Nothing has been requested yet.
    #[default]
    Idle,

    /// A request is in progress.
    Loading,

    /// The last request completed successfully.
    Loaded,

    /// The last request failed.
    Failed {
        /// Error category for display.
        kind: ErrorKind,
        /// Human-readable error message.
        message: String,
    },
}

impl SliceStatus {
    /// Creates a Failed state.
    #[must_use]
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Returns true if a request is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if the last request succeeded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Returns true if the last request failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the error kind if in Failed state.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Categories of backend failures for user-friendly display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The session tokens were rejected.
    Unauthorized,

    /// The backend answered with a non-success status.
    Server,

    /// The backend could not be reached.
    Transport,

    /// The request timed out.
    Timeout,

    /// The response was not the expected JSON.
    MalformedBody,

    /// The client was misconfigured.
    InvalidConfig,
}

impl ErrorKind {
    /// Returns a human-readable title for this error type.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Session Expired",
            Self::Server => "Server Error",
            Self::Transport => "Connection Failed",
            Self::Timeout => "Request Timeout",
            Self::MalformedBody => "Unexpected Response",
            Self::InvalidConfig => "Invalid Configuration",
        }
    }

    /// Returns user-friendly suggestions for this error type.
    #[must_use]
    pub const fn suggestions(&self) -> &[&'static str] {
        match self {
            Self::Unauthorized => &["Log out and sign in again to obtain fresh tokens"],
            Self::Server => &[
                "The backend rejected the request",
                "Check the error details for more information",
            ],
            Self::Transport => &[
                "Check if the backend is running",
                "Verify your network connection",
            ],
            Self::Timeout => &[
                "The backend may be slow or overloaded",
                "Try increasing the request timeout",
            ],
            Self::MalformedBody => &["The backend may be a different version than expected"],
            Self::InvalidConfig => &["Check the backend URL and session values"],
        }
    }
}
