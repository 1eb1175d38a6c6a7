//! Filtered-image HTTP service.
//!
//! Validates a public image URL, probes it, filters it to a local artifact,
//! streams the artifact back and deletes it once the response is done.

pub mod cleanup;
pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
