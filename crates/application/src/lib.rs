//! Force NPM Application - View-model and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for the backend)
//! - The view-model reacting to user actions
//! - Application-level error handling

pub mod error;
pub mod ports;
pub mod view_model;

pub use error::{ApplicationError, ApplicationResult};
pub use ports::{BackendError, BackendResult, ForceNpmBackend};
pub use view_model::{CreateHandle, ForceNpmViewModel, SessionLinks, ViewState};
