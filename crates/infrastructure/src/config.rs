//! Session configuration loading.
//!
//! The session values come from, in order of precedence:
//! 1. an explicit JSON file
//! 2. `FORCENPM_*` environment variables, when `FORCENPM_BACKEND_URL` is set
//! 3. the platform config file:
//!    - Linux/macOS: ~/.config/forcenpm/session.json
//!    - Windows: %APPDATA%/forcenpm/session.json

use std::path::{Path, PathBuf};

use forcenpm_domain::{DomainError, Mode, SessionConfig};
use tokio::fs;
use tracing::debug;

/// Base URL of the backend.
pub const ENV_BACKEND_URL: &str = "FORCENPM_BACKEND_URL";
/// Identity-provider URL.
pub const ENV_ID_URL: &str = "FORCENPM_ID_URL";
/// Access token.
pub const ENV_ACCESS_TOKEN: &str = "FORCENPM_ACCESS_TOKEN";
/// Refresh token.
pub const ENV_REFRESH_TOKEN: &str = "FORCENPM_REFRESH_TOKEN";
/// Organization instance URL.
pub const ENV_INSTANCE_URL: &str = "FORCENPM_INSTANCE_URL";
/// Logout URL.
pub const ENV_LOGOUT_URL: &str = "FORCENPM_LOGOUT_URL";
/// Stylesheet URL.
pub const ENV_SLDS_URL: &str = "FORCENPM_SLDS_URL";
/// `Prod` or `Dev`.
pub const ENV_MODE: &str = "FORCENPM_MODE";
/// Per-request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "FORCENPM_REQUEST_TIMEOUT_MS";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading the config file.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid JSON.
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required environment variable is missing.
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    /// An environment variable has an unusable value.
    #[error("invalid value for {var}: {message}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The values were read but do not form a valid session.
    #[error("invalid session: {0}")]
    Domain(#[from] DomainError),

    /// No source provided a configuration.
    #[error("no session configuration found; set FORCENPM_BACKEND_URL or pass a config file")]
    NotFound,
}

/// Returns the path of the platform config file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("forcenpm").join("session.json"))
}

/// Loads the session configuration from the first available source.
///
/// # Errors
///
/// Returns an error if the chosen source is unreadable or invalid, or
/// [`ConfigError::NotFound`] if there is no source at all.
pub async fn load_session_config(explicit: Option<&Path>) -> Result<SessionConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_session_file(path).await;
    }

    if std::env::var_os(ENV_BACKEND_URL).is_some() {
        debug!("reading session from environment");
        return session_from_env();
    }

    match default_config_path() {
        Some(path) if path.exists() => read_session_file(&path).await,
        _ => Err(ConfigError::NotFound),
    }
}

/// Reads a session from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or holds an
/// invalid session.
pub async fn read_session_file(path: &Path) -> Result<SessionConfig, ConfigError> {
    debug!(path = %path.display(), "reading session file");
    let content = fs::read(path).await.map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SessionConfig = serde_json::from_slice(&content)?;
    config.validate()?;
    Ok(config)
}

/// Reads a session from the process environment.
///
/// # Errors
///
/// Returns an error if a required variable is missing or a value is invalid.
pub fn session_from_env() -> Result<SessionConfig, ConfigError> {
    session_from_lookup(|key| std::env::var(key).ok())
}

/// Builds a session from a variable lookup function.
///
/// Empty values count as unset.
///
/// # Errors
///
/// Returns an error if a required variable is missing or a value is invalid.
pub fn session_from_lookup<F>(lookup: F) -> Result<SessionConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let require = |key: &'static str| get(key).ok_or(ConfigError::MissingVar(key));

    let mut config = SessionConfig::new(
        &require(ENV_BACKEND_URL)?,
        require(ENV_ACCESS_TOKEN)?,
        require(ENV_INSTANCE_URL)?,
    )?;

    config.id_url = get(ENV_ID_URL).unwrap_or_default();
    config.refresh_token = get(ENV_REFRESH_TOKEN).unwrap_or_default();
    config.logout_url = get(ENV_LOGOUT_URL);
    config.slds_url = get(ENV_SLDS_URL);

    if let Some(mode) = get(ENV_MODE) {
        config.mode = mode.parse::<Mode>()?;
    }

    if let Some(timeout) = get(ENV_REQUEST_TIMEOUT_MS) {
        let timeout_ms = timeout
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidVar {
                var: ENV_REQUEST_TIMEOUT_MS,
                message: e.to_string(),
            })?;
        config.request_timeout_ms = Some(timeout_ms);
    }

    Ok(config)
}
