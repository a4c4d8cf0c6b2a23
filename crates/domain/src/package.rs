//! npm package lookups and the payloads tied to them.
//!
//! The backend owns the shape of search suggestions, file references and
//! creation results; the client passes them through as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered version strings of one package.
pub type PackageVersionList = Vec<String>;

/// A single autocomplete suggestion returned by `/npm/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageSuggestion(pub Value);

impl PackageSuggestion {
    /// Best-effort display text: the string itself, or its `name` or
    /// `value` field.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) => Some(s),
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("value"))
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

/// A file reference tied to one provisioned resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileReference(pub Value);

impl FileReference {
    /// Returns a string field of the reference, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Payload returned after provisioning a new resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedResource(pub Value);
