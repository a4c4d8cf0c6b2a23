//! Infrastructure adapters

mod reqwest_backend;

pub use reqwest_backend::ReqwestBackendClient;
