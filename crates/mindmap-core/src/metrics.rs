//! Process-wide atomic counters for generation runs.
//!
//! Counters are incremented silently by the orchestrator. Call
//! [`Metrics::flush`] to emit the current values as a single
//! `tracing::info!` event (e.g. when the CLI exits).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, updated without locking.
pub struct Metrics {
    runs_started: AtomicU64,
    attempts: AtomicU64,
    validation_failures: AtomicU64,
    runs_succeeded: AtomicU64,
    runs_failed: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub attempts: u64,
    pub validation_failures: u64,
    pub runs_succeeded: u64,
    pub runs_failed: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            runs_succeeded: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
        }
    }

    pub fn inc_runs_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_started", "counter incremented");
    }

    /// One generate-validate cycle started.
    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "attempts", "counter incremented");
    }

    /// A generator response was rejected by the grammar.
    pub fn inc_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validation_failures", "counter incremented");
    }

    pub fn inc_runs_succeeded(&self) {
        self.runs_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_succeeded", "counter incremented");
    }

    pub fn inc_runs_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_failed", "counter incremented");
    }

    /// Read every counter at once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            runs_succeeded: self.runs_succeeded.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            metric = "flush",
            runs_started = s.runs_started,
            attempts = s.attempts,
            validation_failures = s.validation_failures,
            runs_succeeded = s.runs_succeeded,
            runs_failed = s.runs_failed,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.runs_started.store(0, Ordering::Relaxed);
        self.attempts.store(0, Ordering::Relaxed);
        self.validation_failures.store(0, Ordering::Relaxed);
        self.runs_succeeded.store(0, Ordering::Relaxed);
        self.runs_failed.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_runs_started();
        m.inc_attempts();
        m.inc_attempts();
        m.inc_validation_failures();
        m.inc_runs_succeeded();

        let s = m.snapshot();
        assert_eq!(s.runs_started, 1);
        assert_eq!(s.attempts, 2);
        assert_eq!(s.validation_failures, 1);
        assert_eq!(s.runs_succeeded, 1);
        assert_eq!(s.runs_failed, 0);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_runs_started();
        m.inc_attempts();
        m.inc_runs_failed();
        m.reset();
        assert_eq!(
            m.snapshot(),
            MetricsSnapshot {
                runs_started: 0,
                attempts: 0,
                validation_failures: 0,
                runs_succeeded: 0,
                runs_failed: 0,
            }
        );
    }
}
