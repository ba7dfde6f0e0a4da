//! Service modules
//!
//! Request-independent work that the HTTP handler delegates to.

pub mod upload_executor;

pub use upload_executor::{destination_name, UploadExecutor};
