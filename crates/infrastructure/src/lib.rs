//! Force NPM Infrastructure - Adapters and configuration
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus session configuration loading.

pub mod adapters;
pub mod config;

pub use adapters::ReqwestBackendClient;
pub use config::{
    ConfigError, default_config_path, load_session_config, read_session_file, session_from_env,
    session_from_lookup,
};
