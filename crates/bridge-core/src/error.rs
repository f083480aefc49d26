//! Error types and result aliases for the compile bridge.
//!
//! Only faults in the orchestration itself are errors. A source file that fails
//! to compile, a missing compiler, or a crashed subprocess are normal
//! [`CompilationOutcome`](crate::outcome::CompilationOutcome)s, not errors.

use std::path::PathBuf;

/// The result type used throughout the bridge.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while orchestrating a compilation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filesystem operation on the scratch area or artifact failed.
    #[error("io error at {}: {message}", path.display())]
    Io {
        /// Description of the failed operation.
        message: String,
        /// Path the operation targeted.
        path: PathBuf,
        /// The underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// Invalid input or configuration was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new I/O error for the given path.
    #[must_use]
    pub fn io(message: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
