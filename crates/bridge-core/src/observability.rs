//! Observability infrastructure for the compile bridge.
//!
//! Structured, leveled logging with a consistent span per compile operation.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::id::ScratchToken;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `bridge_core=debug`)
///
/// # Example
///
/// ```rust
/// use bridge_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates the span that wraps one compile operation.
///
/// # Example
///
/// ```rust
/// use bridge_core::id::ScratchToken;
/// use bridge_core::observability::compile_span;
///
/// let span = compile_span(&ScratchToken::generate(), "per_request");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn compile_span(token: &ScratchToken, isolation: &str) -> Span {
    tracing::info_span!("compile", token = %token, isolation = isolation)
}
