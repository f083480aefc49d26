//! Symbol counters scraped from compiler output.
//!
//! The external compiler reports its counts only as text on stdout, e.g.
//! `KEYWORDS: 4` and `IDENTIFIERS: 9`. Matching is case-insensitive, the first
//! occurrence wins, and a missing or unparseable value counts as zero.

use std::sync::OnceLock;

use regex::Regex;

/// Keyword and identifier counts reported by the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolCounts {
    /// Number of keywords.
    pub keywords: u64,
    /// Number of identifiers.
    pub identifiers: u64,
}

#[allow(clippy::expect_used)]
fn keywords_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)KEYWORDS:\s*([0-9]+)").expect("literal pattern"))
}

#[allow(clippy::expect_used)]
fn identifiers_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)IDENTIFIERS:\s*([0-9]+)").expect("literal pattern"))
}

fn first_count(pattern: &Regex, text: &str) -> u64 {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(0)
}

/// Extracts both counters from captured stdout.
#[must_use]
pub fn extract_counts(stdout: &str) -> SymbolCounts {
    SymbolCounts {
        keywords: first_count(keywords_pattern(), stdout),
        identifiers: first_count(identifiers_pattern(), stdout),
    }
}
