// crates/client/src/lib.rs
//! REST client for a bulk-add server.

pub mod config;
pub mod http;
mod wire;

pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use http::HttpJobsApi;
