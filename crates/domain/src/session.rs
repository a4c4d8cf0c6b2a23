//! Session configuration handed over by the hosting environment.
//!
//! Every backend call forwards the identity URL, tokens and instance URL
//! of the current session as request headers.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Header carrying the identity-provider URL.
pub const HEADER_ID_URL: &str = "X-ID-URL";
/// Header carrying the access token.
pub const HEADER_ACCESS_TOKEN: &str = "X-ACCESS-TOKEN";
/// Header carrying the refresh token.
pub const HEADER_REFRESH_TOKEN: &str = "X-REFRESH-TOKEN";
/// Header carrying the organization instance URL.
pub const HEADER_INSTANCE_URL: &str = "X-INSTANCE-URL";

/// Deployment mode of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Development mode (verbose logging).
    #[default]
    Dev,
    /// Production mode.
    Prod,
}

impl Mode {
    /// Returns true in production mode.
    #[must_use]
    pub const fn is_prod(self) -> bool {
        matches!(self, Self::Prod)
    }

    /// Default log filter for this mode.
    #[must_use]
    pub const fn default_log_filter(self) -> &'static str {
        match self {
            Self::Dev => "info",
            Self::Prod => "warn",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("prod") {
            Ok(Self::Prod)
        } else if s.eq_ignore_ascii_case("dev") {
            Ok(Self::Dev)
        } else {
            Err(DomainError::UnknownMode(s.to_string()))
        }
    }
}

/// Values describing the current session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the backend serving `/force/*` and `/npm/*`.
    pub backend_url: Url,
    /// Identity-provider URL.
    #[serde(default)]
    pub id_url: String,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: String,
    /// Base URL of the connected organization.
    pub instance_url: String,
    /// Where the user goes to sign out. Display only.
    #[serde(default)]
    pub logout_url: Option<String>,
    /// Stylesheet location used for branding. Display only.
    #[serde(default)]
    pub slds_url: Option<String>,
    /// Deployment mode.
    #[serde(default)]
    pub mode: Mode,
    /// Per-request timeout. Unset means requests may wait forever.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl SessionConfig {
    /// Creates a configuration with the required values.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL does not parse or a required
    /// value is empty.
    pub fn new(
        backend_url: &str,
        access_token: impl Into<String>,
        instance_url: impl Into<String>,
    ) -> DomainResult<Self> {
        let backend_url =
            Url::parse(backend_url).map_err(|e| DomainError::InvalidUrl(format!("{e}: {backend_url}")))?;
        let config = Self {
            backend_url,
            id_url: String::new(),
            access_token: access_token.into(),
            refresh_token: String::new(),
            instance_url: instance_url.into(),
            logout_url: None,
            slds_url: None,
            mode: Mode::default(),
            request_timeout_ms: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the identity-provider URL.
    #[must_use]
    pub fn with_id_url(mut self, id_url: impl Into<String>) -> Self {
        self.id_url = id_url.into();
        self
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = refresh_token.into();
        self
    }

    /// Sets the deployment mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    /// Checks that the required values are present.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingSessionValue`] naming the first empty
    /// required value, or [`DomainError::InvalidUrl`] if the backend URL
    /// cannot serve as a base.
    pub fn validate(&self) -> DomainResult<()> {
        if self.backend_url.cannot_be_a_base() {
            return Err(DomainError::InvalidUrl(self.backend_url.to_string()));
        }
        if self.access_token.trim().is_empty() {
            return Err(DomainError::MissingSessionValue("access_token"));
        }
        if self.instance_url.trim().is_empty() {
            return Err(DomainError::MissingSessionValue("instance_url"));
        }
        Ok(())
    }

    /// The four session headers in the order they are attached.
    #[must_use]
    pub fn session_headers(&self) -> [(&'static str, &str); 4] {
        [
            (HEADER_ID_URL, self.id_url.as_str()),
            (HEADER_ACCESS_TOKEN, self.access_token.as_str()),
            (HEADER_REFRESH_TOKEN, self.refresh_token.as_str()),
            (HEADER_INSTANCE_URL, self.instance_url.as_str()),
        ]
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("id_url", &self.id_url)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("instance_url", &self.instance_url)
            .field("logout_url", &self.logout_url)
            .field("slds_url", &self.slds_url)
            .field("mode", &self.mode)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}
