//! Shared test utilities for compile bridge tests.
//!
//! This crate provides:
//! - [`TestDeployment`]: a throwaway deployment directory with a scratch root
//! - [`stubs`]: shell scripts that stand in for the external compiler
//! - Assertion helpers for scratch-area hygiene
//!
//! Stub compilers are run as `/bin/sh <script>` rather than executed directly.
//! Executing a file that was just written races with concurrent forks in the
//! same test binary (`ETXTBSY`).
//!
//! # Example
//!
//! ```rust,ignore
//! use bridge_test_utils::{TestDeployment, stubs};
//!
//! let deployment = TestDeployment::new();
//! let compiler = deployment.install_stub(stubs::REFERENCE);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;
pub mod stubs;

pub use assertions::*;
pub use fixtures::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bridge_core=debug".parse().expect("valid directive"))
                .add_directive("bridge_api=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
