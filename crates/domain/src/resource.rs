//! Provisioned "force npm" resources.
//!
//! The backend lists each provisioned package as a record whose free-text
//! `Description` reads `NPM Package: <name> <version>`. The client only
//! cares about the name and version, so [`ProvisionedResource`] is derived
//! from that text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix the backend writes in front of every package description.
pub const DESCRIPTION_PREFIX: &str = "NPM Package: ";

/// A raw entry of the `/force/npm` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceNpmRecord {
    /// Free-text description carrying the package name and version.
    ///
    /// Kept as raw JSON: a non-string value must not fail the whole list.
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    /// Every other field of the record, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ForceNpmRecord {
    /// Creates a record with only a description.
    #[must_use]
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(Value::String(description.into())),
            extra: Map::new(),
        }
    }

    /// The description text, if the backend sent a string.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_ref().and_then(Value::as_str)
    }
}

/// A package installed into the connected organization.
///
/// Either field may be absent when the description could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvisionedResource {
    /// npm package name.
    pub name: Option<String>,
    /// npm package version.
    pub version: Option<String>,
}

impl ProvisionedResource {
    /// Creates a resource with both fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
        }
    }

    /// Parses a description of the form `NPM Package: <name> <version>`.
    ///
    /// Never fails: missing or empty tokens become `None`. Text without the
    /// prefix is split as is.
    #[must_use]
    pub fn from_description(description: &str) -> Self {
        let rest = description.replacen(DESCRIPTION_PREFIX, "", 1);
        let mut parts = rest.split(' ');
        let token = |part: Option<&str>| part.filter(|p| !p.is_empty()).map(str::to_string);
        let name = token(parts.next());
        let version = token(parts.next());
        Self { name, version }
    }

    /// Returns true when the resource has a name to look files up by.
    #[must_use]
    pub const fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Display label, `name@version` with `?` for missing parts.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}@{}",
            self.name.as_deref().unwrap_or("?"),
            self.version.as_deref().unwrap_or("?")
        )
    }
}

impl From<&ForceNpmRecord> for ProvisionedResource {
    fn from(record: &ForceNpmRecord) -> Self {
        record
            .description_text()
            .map_or_else(Self::default, Self::from_description)
    }
}

/// Parses every record of a backend list, preserving order.
#[must_use]
pub fn parse_records(records: &[ForceNpmRecord]) -> Vec<ProvisionedResource> {
    records.iter().map(ProvisionedResource::from).collect()
}
