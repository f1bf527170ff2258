//! Structured observability hooks for generation runs.
//!
//! This module provides:
//! - a run-scoped span, attached to every step of a run's event stream
//! - emission functions for lifecycle events: start, validated attempt,
//!   generator failure, finish
//!
//! Events are emitted at `info!` level except generator failures (`warn!`).
//! Filter with `RUST_LOG`; pass `--json-logs` to the CLI for JSON output.

use tracing::{info, warn};

/// Span tagged with the run id. Entered around each step of the run rather
/// than held, since a run suspends between steps.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("mindmap.run", run_id = %run_id)
}

/// Emit event: run started against a generator backend.
///
/// # Example
///
/// ```ignore
/// emit_run_started("run-123", "ollama", 3);
/// // logs: event=run.started run_id=run-123 generator=ollama max_attempts=3
/// ```
pub fn emit_run_started(run_id: &str, generator: &str, max_attempts: u32) {
    info!(
        event = "run.started",
        run_id = %run_id,
        generator = %generator,
        max_attempts = max_attempts,
    );
}

/// Emit event: one generator response was checked against the grammar.
pub fn emit_attempt_validated(run_id: &str, attempt: u32, valid: bool) {
    info!(
        event = "run.attempt_validated",
        run_id = %run_id,
        attempt = attempt,
        valid = valid,
    );
}

/// Emit event: the generator itself failed (warning level).
pub fn emit_generation_failed(run_id: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(event = "run.generation_failed", run_id = %run_id, attempt = attempt, error = %error);
}

/// Emit event: run reached a terminal state.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, attempts_used: u32, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        attempts_used = attempts_used,
        success = success,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_run_span_create() {
        let span = run_span("test-run-id");
        let _guard = span.enter();
    }

    #[traced_test]
    #[test]
    fn test_lifecycle_events_are_logged() {
        emit_run_started("run-1", "scripted", 3);
        emit_attempt_validated("run-1", 1, false);
        emit_run_finished("run-1", 12, 2, true);

        assert!(logs_contain("run.started"));
        assert!(logs_contain("run.attempt_validated"));
        assert!(logs_contain("run.finished"));
    }

    #[traced_test]
    #[test]
    fn test_generation_failure_is_logged() {
        emit_generation_failed("run-2", 1, &"model not found");
        assert!(logs_contain("model not found"));
    }
}
