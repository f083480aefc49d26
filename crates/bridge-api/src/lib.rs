//! # bridge-api
//!
//! HTTP composition layer for the compile bridge.
//!
//! This crate is a thin layer over [`bridge_core::CompileGateway`]: it parses
//! requests, maps outcomes and faults onto HTTP, and carries the ambient
//! concerns (CORS, tracing, metrics, configuration).
//!
//! ## Endpoints
//!
//! ```text
//! ANY     /         - Plain-text banner
//! ANY     /health   - Compiler availability
//! POST    /compile  - Compile source text
//! GET     /metrics  - Prometheus metrics (when enabled)
//! OPTIONS *         - 200, empty body
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use bridge_api::server::Server;
//!
//! # async fn run() -> bridge_core::Result<()> {
//! let server = Server::builder()
//!     .http_port(5000)
//!     .deploy_dir("/srv/bridge")
//!     .build();
//!
//! server.serve().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
