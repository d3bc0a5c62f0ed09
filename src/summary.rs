//! Aggregation of a validation pass into the run summary.

use std::time::Duration;

use crate::config::WorkerCount;
use crate::validator::FileValidationResult;

/// Aggregate of one full validation pass
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of documents validated
    pub total: usize,
    /// Number of documents that failed their schema
    pub failure_count: usize,
    /// Concurrency the pass ran with
    pub workers: WorkerCount,
    /// Start of feeding to completion of the last result
    pub wall_time_ms: u64,
    /// Sum of per-document validator time
    pub cpu_time_ms: u64,
    /// `cpu_time_ms / total`, absent for an empty pass
    pub average_ms: Option<u64>,
    /// Failed results in the order they were produced
    pub failures: Vec<FileValidationResult>,
}

impl RunSummary {
    /// Fold the results of a completed pass.
    ///
    /// CPU time is accumulated in microseconds and converted to
    /// milliseconds once, so sub-millisecond validations still count.
    pub fn collect(
        results: Vec<FileValidationResult>,
        wall_time: Duration,
        workers: WorkerCount,
    ) -> Self {
        let total = results.len();
        let cpu_time_us: u128 = results.iter().map(|r| r.elapsed.as_micros()).sum();
        let cpu_time_ms = (cpu_time_us / 1000) as u64;

        let failures: Vec<FileValidationResult> =
            results.into_iter().filter(|r| !r.success).collect();

        Self {
            total,
            failure_count: failures.len(),
            workers,
            wall_time_ms: wall_time.as_millis() as u64,
            cpu_time_ms,
            average_ms: (total > 0).then(|| cpu_time_ms / total as u64),
            failures,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}
