//! View state exposed to the rendering layer.

use forcenpm_domain::{
    FileReference, Mode, PackageVersionList, ProvisionedResource, SessionConfig, SliceStatus,
    UserOrgInfo,
};

/// Links and flags the front end shows but never sends to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLinks {
    /// Base URL of the connected organization.
    pub instance_url: String,
    /// Where the user goes to sign out.
    pub logout_url: Option<String>,
    /// Stylesheet location used for branding.
    pub slds_url: Option<String>,
    /// Deployment mode.
    pub mode: Mode,
}

impl From<&SessionConfig> for SessionLinks {
    fn from(config: &SessionConfig) -> Self {
        Self {
            instance_url: config.instance_url.clone(),
            logout_url: config.logout_url.clone(),
            slds_url: config.slds_url.clone(),
            mode: config.mode,
        }
    }
}

/// Everything the page shows, as one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Display-only session values.
    pub links: SessionLinks,

    /// Current user and organization.
    pub user_org_info: UserOrgInfo,
    /// Load state of `user_org_info`.
    pub user_info_status: SliceStatus,

    /// Provisioned resources, in backend order.
    pub resources: Vec<ProvisionedResource>,
    /// Load state of `resources`.
    pub resources_status: SliceStatus,

    /// Package-name input field.
    pub package_name: Option<String>,
    /// Package-version input field.
    pub package_version: Option<String>,
    /// Versions available for `package_name`.
    pub package_versions: PackageVersionList,
    /// Load state of `package_versions`.
    pub versions_status: SliceStatus,

    /// Outcome of the last create request.
    pub create_status: SliceStatus,

    /// Resource whose files are shown.
    pub selected: Option<ProvisionedResource>,
    /// Files of `selected`.
    pub files: Vec<FileReference>,
    /// Load state of `files`.
    pub files_status: SliceStatus,

    /// Raised once any call is rejected for bad tokens.
    pub session_expired: bool,
}

impl ViewState {
    /// Creates an empty state carrying the given links.
    #[must_use]
    pub fn with_links(links: SessionLinks) -> Self {
        Self {
            links,
            ..Self::default()
        }
    }

    /// Returns true if any slice has a request in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.user_info_status.is_loading()
            || self.resources_status.is_loading()
            || self.versions_status.is_loading()
            || self.create_status.is_loading()
            || self.files_status.is_loading()
    }

    /// Returns true if `resource` is the current selection.
    #[must_use]
    pub fn is_selected(&self, resource: &ProvisionedResource) -> bool {
        self.selected.as_ref() == Some(resource)
    }
}
