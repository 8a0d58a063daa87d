//! Metrics for group synchronization
//!
//! Thin wrappers over the `metrics` facade. Nothing is recorded unless the
//! application installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Register descriptions for every metric the library records
pub fn init_metrics() {
    describe_counter!("group.batches.applied", "Number of MembersChanged batches applied");
    describe_counter!("group.batches.ignored", "Batches dropped because the group was not ready");
    describe_counter!(
        "group.handles.unresolved",
        "Handles skipped because they could not be resolved"
    );
    describe_counter!("group.events.emitted", "Number of group events emitted");
    describe_counter!("group.bootstrap.retries", "Bootstrap attempts that failed and were retried");
    describe_counter!("group.bootstrap.failed", "Bootstraps that gave up");
    describe_histogram!(
        "group.bootstrap.duration_ms",
        "Time to fetch and apply the initial membership"
    );
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Record a histogram metric
pub fn record_histogram(name: &'static str, value: f64) {
    histogram!(name).record(value);
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration in milliseconds
    pub fn stop(self) {
        record_histogram(self.name, self.start.elapsed().as_secs_f64() * 1000.0);
    }
}
