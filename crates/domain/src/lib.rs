//! Force NPM Domain - Core business types
//!
//! This crate defines the domain model for the Force NPM client.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod package;
pub mod resource;
pub mod session;
pub mod state;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use package::{CreatedResource, FileReference, PackageSuggestion, PackageVersionList};
pub use resource::{DESCRIPTION_PREFIX, ForceNpmRecord, ProvisionedResource, parse_records};
pub use session::{Mode, SessionConfig};
pub use state::{ErrorKind, SliceStatus};
pub use user::UserOrgInfo;
