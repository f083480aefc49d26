//! Compile metrics.
//!
//! Complements the structured logs with counters an operator can alert on.
//! Recording is a no-op until a recorder is installed.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

use crate::outcome::OutcomeKind;

// ============================================================================
// Metric Names
// ============================================================================

/// Compile outcomes by kind.
pub const COMPILE_OUTCOMES: &str = "bridge_compile_outcomes_total";

/// Compile duration histogram (request accepted to outcome ready).
pub const COMPILE_DURATION: &str = "bridge_compile_duration_seconds";

/// Orchestration faults surfaced as internal errors.
pub const COMPILE_FAULTS: &str = "bridge_compile_faults_total";

/// Overlapping invocations in shared artifact mode.
pub const ARTIFACT_CONTENTION: &str = "bridge_artifact_contention_total";

// ============================================================================
// Metric Registration
// ============================================================================

/// Registers all compile metric descriptions.
///
/// Call this once at application startup after initializing the metrics recorder.
pub fn register_metrics() {
    describe_counter!(COMPILE_OUTCOMES, "Total compile requests by outcome");
    describe_histogram!(COMPILE_DURATION, "Duration of compile requests in seconds");
    describe_counter!(COMPILE_FAULTS, "Total compile requests that failed internally");
    describe_counter!(
        ARTIFACT_CONTENTION,
        "Total compiler invocations that overlapped another in shared artifact mode"
    );
}

// ============================================================================
// Recording
// ============================================================================

/// Records a finished compile request.
pub fn record_compile(kind: OutcomeKind, elapsed: Duration) {
    let labels = [("outcome", kind.as_str().to_string())];
    counter!(COMPILE_OUTCOMES, &labels).increment(1);
    histogram!(COMPILE_DURATION, &labels).record(elapsed.as_secs_f64());
}

/// Records a compile request that ended in an internal error.
pub fn record_compile_fault() {
    counter!(COMPILE_FAULTS).increment(1);
}

/// Records an overlapping invocation in shared artifact mode.
pub fn record_artifact_contention() {
    counter!(ARTIFACT_CONTENTION).increment(1);
}
