//! Identity information for the connected organization.

use serde::{Deserialize, Serialize};

/// The signed-in user and the organization they belong to.
///
/// Field names follow the backend payload verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOrgInfo {
    /// Organization name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Organization edition, e.g. "Developer Edition".
    #[serde(rename = "OrganizationType", default)]
    pub organization_type: String,
    /// Login name of the current user.
    #[serde(default)]
    pub username: String,
}
