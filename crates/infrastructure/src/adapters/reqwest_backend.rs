//! Backend client implementation using reqwest.
//!
//! This adapter implements the `ForceNpmBackend` port. The session headers
//! are built once into the client's default header map, so every request
//! carries them without per-call work.

use std::future::Future;
use std::time::Duration;

use forcenpm_application::ports::{BackendError, BackendResult, ForceNpmBackend};
use forcenpm_domain::{
    CreatedResource, FileReference, ForceNpmRecord, PackageSuggestion, PackageVersionList,
    SessionConfig, UserOrgInfo, session::HEADER_ID_URL, session::HEADER_INSTANCE_URL,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

const USER_INFO_PATH: &str = "force/userinfo";
const FORCE_NPM_PATH: &str = "force/npm";
const SEARCH_PATH: &str = "npm/search";
const VERSIONS_PATH: &str = "npm/versions";
const FILES_PATH: &str = "npm/files";

/// Backend client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestBackendClient {
    client: Client,
    base_url: Url,
    timeout_ms: Option<u64>,
}

impl ReqwestBackendClient {
    /// Creates a client for the given session.
    ///
    /// Configuration:
    /// - Session headers: attached to every request
    /// - Timeout: `request_timeout_ms`, none when unset
    /// - User-Agent: "forcenpm/<version>"
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidConfig`] if a session value is not a
    /// valid header value or the client cannot be created.
    pub fn new(config: &SessionConfig) -> BackendResult<Self> {
        config
            .validate()
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;

        let mut builder = Client::builder()
            .user_agent(concat!("forcenpm/", env!("CARGO_PKG_VERSION")))
            .default_headers(Self::session_headers(config)?);
        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: Self::normalize_base(config.backend_url.clone()),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Builds the fixed header map from the session values.
    fn session_headers(config: &SessionConfig) -> BackendResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.session_headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BackendError::InvalidConfig(format!("{name}: {e}")))?;
            let mut header_value = HeaderValue::from_str(value)
                .map_err(|e| BackendError::InvalidConfig(format!("{name}: {e}")))?;
            // Tokens stay out of debug output.
            header_value.set_sensitive(name != HEADER_ID_URL && name != HEADER_INSTANCE_URL);
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    /// Makes sure relative paths join below the base path.
    fn normalize_base(mut url: Url) -> Url {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }

    /// Resolves an endpoint path and its query parameters.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> BackendResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::InvalidConfig(format!("{e}: {path}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, method: Method, url: Url) -> BackendResult<T> {
        debug!(%method, path = url.path(), "backend request");

        let response = self
            .client
            .request(method.clone(), url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        debug!(%method, status = status.as_u16(), "backend response");

        if !status.is_success() {
            let message = Self::status_message(status, response.text().await);
            return Err(BackendError::from_status(status.as_u16(), message));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::MalformedBody(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> BackendResult<T> {
        let url = self.endpoint(path, query)?;
        self.send_json(Method::GET, url).await
    }

    /// Message for a non-success response: the body text, or the reason
    /// phrase when the body is empty or unreadable.
    fn status_message<E: std::fmt::Display>(status: StatusCode, body: Result<String, E>) -> String {
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "could not read error body");
                String::new()
            }
        };
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            body
        }
    }

    /// Maps reqwest errors to the port's `BackendError`.
    fn map_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            return BackendError::Timeout {
                timeout_ms: self.timeout_ms.unwrap_or_default(),
            };
        }
        if error.is_decode() {
            return BackendError::MalformedBody(error.to_string());
        }
        BackendError::Transport(error.to_string())
    }
}

impl ForceNpmBackend for ReqwestBackendClient {
    fn fetch_user_info(&self) -> impl Future<Output = BackendResult<UserOrgInfo>> + Send {
        async move { self.get_json(USER_INFO_PATH, &[]).await }
    }

    fn list_provisioned_resources(
        &self,
    ) -> impl Future<Output = BackendResult<Vec<ForceNpmRecord>>> + Send {
        async move { self.get_json(FORCE_NPM_PATH, &[]).await }
    }

    fn search_packages(
        &self,
        query: &str,
    ) -> impl Future<Output = BackendResult<Vec<PackageSuggestion>>> + Send {
        async move { self.get_json(SEARCH_PATH, &[("query", query)]).await }
    }

    fn list_package_versions(
        &self,
        name: &str,
    ) -> impl Future<Output = BackendResult<PackageVersionList>> + Send {
        async move { self.get_json(VERSIONS_PATH, &[("name", name)]).await }
    }

    fn create_provisioned_resource(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = BackendResult<CreatedResource>> + Send {
        async move {
            let url = self.endpoint(FORCE_NPM_PATH, &[("name", name), ("version", version)])?;
            self.send_json(Method::POST, url).await
        }
    }

    fn list_file_references(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> impl Future<Output = BackendResult<Vec<FileReference>>> + Send {
        async move {
            match version {
                Some(version) => {
                    self.get_json(FILES_PATH, &[("name", name), ("version", version)])
                        .await
                }
                None => self.get_json(FILES_PATH, &[("name", name)]).await,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(backend_url: &str) -> ReqwestBackendClient {
        let config = SessionConfig::new(backend_url, "token", "https://acme.my.salesforce.com")
            .unwrap();
        ReqwestBackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client("https://npm.example.com");
        assert_eq!(client.base_url.as_str(), "https://npm.example.com/");
        assert_eq!(client.timeout_ms, None);
    }

    #[test]
    fn test_endpoint_with_query() {
        let client = client("https://npm.example.com");
        let url = client
            .endpoint(FORCE_NPM_PATH, &[("name", "left-pad"), ("version", "1.3.0")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://npm.example.com/force/npm?name=left-pad&version=1.3.0"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://host.example.com/app");
        let url = client.endpoint(USER_INFO_PATH, &[]).unwrap();
        assert_eq!(url.as_str(), "https://host.example.com/app/force/userinfo");
    }

    #[test]
    fn test_endpoint_encodes_scoped_names() {
        let client = client("https://npm.example.com");
        let url = client
            .endpoint(VERSIONS_PATH, &[("name", "@salesforce/core")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://npm.example.com/npm/versions?name=%40salesforce%2Fcore"
        );
    }

    #[test]
    fn test_session_headers() {
        let config = SessionConfig::new(
            "https://npm.example.com",
            "access",
            "https://acme.my.salesforce.com",
        )
        .unwrap()
        .with_id_url("https://login.salesforce.com/id/00D/005")
        .with_refresh_token("refresh");

        let headers = ReqwestBackendClient::session_headers(&config).unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers["x-access-token"], "access");
        assert_eq!(headers["x-refresh-token"], "refresh");
        assert_eq!(
            headers["x-instance-url"],
            "https://acme.my.salesforce.com"
        );
        assert!(headers["x-access-token"].is_sensitive());
        assert!(!headers["x-id-url"].is_sensitive());
    }

    #[test]
    fn test_status_message() {
        let ok = |body: &str| Ok::<_, String>(body.to_string());
        assert_eq!(
            ReqwestBackendClient::status_message(StatusCode::UNAUTHORIZED, ok("expired")),
            "expired"
        );
        assert_eq!(
            ReqwestBackendClient::status_message(StatusCode::BAD_GATEWAY, ok("  ")),
            "Bad Gateway"
        );
        assert_eq!(
            ReqwestBackendClient::status_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                Err::<String, _>("connection reset")
            ),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_invalid_header_value() {
        let config = SessionConfig::new(
            "https://npm.example.com",
            "line\nbreak",
            "https://acme.my.salesforce.com",
        )
        .unwrap();
        let result = ReqwestBackendClient::new(&config);
        assert!(matches!(result, Err(BackendError::InvalidConfig(_))));
    }
}
