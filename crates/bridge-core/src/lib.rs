//! # bridge-core
//!
//! Compilation orchestration for the compile bridge.
//!
//! This crate owns everything between "here is some source text" and "here is
//! a normalized result":
//!
//! - **Scratch resources**: per-request input files and working directories
//!   released on every exit path
//! - **Invocation**: running the external compiler under a deadline
//! - **Outcomes**: the normalized result shape and counter extraction
//! - **Gateway**: the orchestrator tying the above together
//!
//! ## Example
//!
//! ```rust,no_run
//! use bridge_core::prelude::*;
//!
//! # async fn run() -> bridge_core::Result<()> {
//! let gateway = CompileGateway::new(GatewaySettings::for_deploy_dir("/srv/bridge"));
//! gateway.prepare()?;
//!
//! let outcome = gateway.compile(Some("dhoro x = 10;")).await?;
//! println!("keywords: {}", outcome.keyword_count);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod counters;
pub mod error;
pub mod gateway;
pub mod id;
pub mod invoker;
pub mod metrics;
pub mod observability;
pub mod outcome;
pub mod scratch;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use bridge_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::counters::{SymbolCounts, extract_counts};
    pub use crate::error::{Error, Result};
    pub use crate::gateway::{ArtifactIsolation, CompileGateway, GatewaySettings};
    pub use crate::id::ScratchToken;
    pub use crate::invoker::{CompilerInvoker, ExitState, Invocation};
    pub use crate::outcome::{CompilationOutcome, OutcomeKind};
}

// Re-export key types at crate root for ergonomics
pub use counters::{SymbolCounts, extract_counts};
pub use error::{Error, Result};
pub use gateway::{ArtifactIsolation, CompileGateway, GatewaySettings};
pub use id::ScratchToken;
pub use invoker::{CompilerInvoker, DEFAULT_COMPILE_TIMEOUT};
pub use observability::{LogFormat, init_logging};
pub use outcome::{CompilationOutcome, OutcomeKind};
