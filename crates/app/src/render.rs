//! Plain-text rendering of the view state.

use std::fmt::Write;

use forcenpm_application::ViewState;
use forcenpm_domain::{FileReference, SliceStatus};

/// Organization header: who is signed in and where.
#[must_use]
pub fn header(state: &ViewState) -> String {
    let mut out = String::new();
    let info = &state.user_org_info;
    let _ = writeln!(out, "{} ({})", info.name, info.organization_type);
    let _ = writeln!(out, "  user:     {}", info.username);
    let _ = writeln!(out, "  instance: {}", state.links.instance_url);
    if let Some(logout) = &state.links.logout_url {
        let _ = writeln!(out, "  logout:   {logout}");
    }
    out
}

/// Provisioned resources, one per line, the selection marked with `*`.
#[must_use]
pub fn resources(state: &ViewState) -> String {
    if state.resources.is_empty() {
        return "No npm packages provisioned.\n".to_string();
    }
    let mut out = String::new();
    for resource in &state.resources {
        let marker = if state.is_selected(resource) { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {}", resource.label());
    }
    out
}

/// Available versions of the chosen package.
#[must_use]
pub fn versions(state: &ViewState) -> String {
    let name = state.package_name.as_deref().unwrap_or("?");
    if state.package_versions.is_empty() {
        return format!("No versions found for {name}.\n");
    }
    let mut out = format!("{name}:\n");
    for version in &state.package_versions {
        let _ = writeln!(out, "  {version}");
    }
    out
}

/// File references of the selected resource.
#[must_use]
pub fn files(state: &ViewState) -> String {
    let Some(selected) = &state.selected else {
        return "No resource selected.\n".to_string();
    };
    if state.files.is_empty() {
        return format!("No files for {}.\n", selected.label());
    }
    let mut out = format!("{}:\n", selected.label());
    for file in &state.files {
        let _ = writeln!(out, "  {}", file_line(file));
    }
    out
}

fn file_line(file: &FileReference) -> String {
    match (file.field("name"), file.field("url")) {
        (Some(name), Some(url)) => format!("{name} ({url})"),
        (Some(name), None) => name.to_string(),
        _ => file.0.to_string(),
    }
}

/// Error block for a failed slice, `None` otherwise.
#[must_use]
pub fn failure(label: &str, status: &SliceStatus) -> Option<String> {
    let SliceStatus::Failed { kind, message } = status else {
        return None;
    };
    let mut out = format!("{label}: {} - {message}\n", kind.title());
    for suggestion in kind.suggestions() {
        let _ = writeln!(out, "  hint: {suggestion}");
    }
    Some(out)
}
