//! The normalized result of one compile request.
//!
//! Every compiler-domain failure (empty source, missing compiler, subprocess
//! failure) is a `CompilationOutcome` with `success: false`, delivered with
//! HTTP 200. The serialized field names are the wire contract:
//!
//! ```json
//! {"success": true, "assembly": "...", "output": "...", "keywords": 1, "identifiers": 1}
//! {"success": false, "error": "...", "assembly": "", "output": "...", "keywords": 0, "identifiers": 0}
//! ```

use serde::Serialize;

use crate::counters::SymbolCounts;

/// Message for a request without usable source text.
pub const NO_CODE_PROVIDED: &str = "No code provided";

/// Message for a missing compiler executable.
pub const COMPILER_NOT_FOUND: &str = "Compiler not found";

/// Placeholder returned when the compiler produced no assembly artifact.
pub const NO_ASSEMBLY_PLACEHOLDER: &str = "// No assembly code generated";

/// Output text used when the compiler succeeded silently.
pub const SILENT_SUCCESS_OUTPUT: &str = "Compilation completed";

/// How a compile request ended. Not part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The compiler ran and produced output.
    Success,
    /// The request carried no source text.
    EmptySource,
    /// The compiler executable is missing.
    ToolMissing,
    /// The compiler exited with a failure and no stdout.
    CompileError,
    /// The compiler exceeded its deadline without producing stdout.
    TimedOut,
}

impl OutcomeKind {
    /// Returns the metric label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::EmptySource => "empty_source",
            Self::ToolMissing => "tool_missing",
            Self::CompileError => "compile_error",
            Self::TimedOut => "timeout",
        }
    }
}

/// Result of one compile request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationOutcome {
    /// Whether the compiler ran and produced a usable result.
    #[serde(rename = "success")]
    pub succeeded: bool,
    /// Failure description, present only when `succeeded` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Contents of the assembly artifact.
    #[serde(rename = "assembly")]
    pub assembly_text: String,
    /// Captured compiler stdout, or the diagnostic on failure.
    #[serde(rename = "output")]
    pub diagnostic_text: String,
    /// Keyword count scraped from stdout.
    #[serde(rename = "keywords")]
    pub keyword_count: u64,
    /// Identifier count scraped from stdout.
    #[serde(rename = "identifiers")]
    pub identifier_count: u64,
    #[serde(skip)]
    kind: OutcomeKind,
}

impl CompilationOutcome {
    /// A successful compilation.
    #[must_use]
    pub fn success(stdout: &str, assembly: String, counts: SymbolCounts) -> Self {
        let diagnostic_text = if stdout.is_empty() {
            SILENT_SUCCESS_OUTPUT.to_string()
        } else {
            stdout.to_string()
        };
        Self {
            succeeded: true,
            error: None,
            assembly_text: assembly,
            diagnostic_text,
            keyword_count: counts.keywords,
            identifier_count: counts.identifiers,
            kind: OutcomeKind::Success,
        }
    }

    /// The request carried no source text.
    #[must_use]
    pub fn empty_source() -> Self {
        Self::failure(
            OutcomeKind::EmptySource,
            NO_CODE_PROVIDED,
            format!("Error: {NO_CODE_PROVIDED}"),
        )
    }

    /// The compiler executable is missing.
    #[must_use]
    pub fn tool_missing() -> Self {
        Self::failure(OutcomeKind::ToolMissing, COMPILER_NOT_FOUND, "Compiler missing!")
    }

    /// The compiler failed without producing stdout.
    ///
    /// `diagnostic` is the captured stderr, or the failure reason when stderr
    /// was empty.
    #[must_use]
    pub fn compile_error(diagnostic: &str, timed_out: bool) -> Self {
        let message = format!("Compilation Error:\n{diagnostic}");
        let kind = if timed_out {
            OutcomeKind::TimedOut
        } else {
            OutcomeKind::CompileError
        };
        Self::failure(kind, message.clone(), message)
    }

    fn failure(kind: OutcomeKind, error: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error: Some(error.into()),
            assembly_text: String::new(),
            diagnostic_text: output.into(),
            keyword_count: 0,
            identifier_count: 0,
            kind,
        }
    }

    /// Returns how this request ended.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        self.kind
    }
}
