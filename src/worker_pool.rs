//! Concurrent validation workers
//!
//! Two strategies share one interface:
//! - **Bounded**: a semaphore caps the number of in-flight validations. The
//!   dispatcher waits for a permit before taking the next document, so a busy
//!   pool leaves documents in the queue and the feeder blocks behind them.
//! - **Unbounded**: every dequeued document gets its own task immediately.
//!
//! Validation is CPU-bound and runs on the blocking thread pool.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};

use crate::config::WorkerCount;
use crate::document::Document;
use crate::error::{Result, ValidationError};
use crate::schema_registry::SchemaRegistry;
use crate::validator::{FileValidationResult, StatusCallback, validate_document};

/// Concurrency strategy, selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStrategy {
    /// At most this many validations at once
    Bounded(usize),
    /// One task per document
    Unbounded,
}

impl From<WorkerCount> for PoolStrategy {
    fn from(workers: WorkerCount) -> Self {
        match workers.limit() {
            Some(n) => PoolStrategy::Bounded(n.clamp(1, WorkerCount::MAX)),
            None => PoolStrategy::Unbounded,
        }
    }
}

/// Drains a document queue, validating each document exactly once.
pub struct WorkerPool {
    registry: Arc<SchemaRegistry>,
    strategy: PoolStrategy,
    capture_errors: bool,
    status: Option<StatusCallback>,
}

impl WorkerPool {
    pub fn new(registry: Arc<SchemaRegistry>, strategy: PoolStrategy) -> Self {
        Self {
            registry,
            strategy,
            capture_errors: false,
            status: None,
        }
    }

    /// Keep structured error detail on failed results
    pub fn with_capture_errors(mut self, capture: bool) -> Self {
        self.capture_errors = capture;
        self
    }

    /// Called from the worker as each result is produced
    pub fn with_status_callback(mut self, callback: Option<StatusCallback>) -> Self {
        self.status = callback;
        self
    }

    pub fn strategy(&self) -> PoolStrategy {
        self.strategy
    }

    /// Validate everything the queue yields until it is closed and empty.
    ///
    /// Returns only after every dequeued document has produced exactly one
    /// result; result order is unspecified. A fatal error from any worker
    /// (e.g. a type tag with no schema) stops the pool and is returned.
    pub async fn run(
        &self,
        mut queue: mpsc::Receiver<Document>,
    ) -> Result<Vec<FileValidationResult>> {
        let semaphore = match self.strategy {
            PoolStrategy::Bounded(n) => Some(Arc::new(Semaphore::new(
                n.clamp(1, Semaphore::MAX_PERMITS),
            ))),
            PoolStrategy::Unbounded => None,
        };
        tracing::debug!(strategy = ?self.strategy, "worker pool started");

        let mut tasks = JoinSet::new();
        let mut results = Vec::new();

        while let Some(document) = queue.recv().await {
            let permit = match &semaphore {
                Some(semaphore) => Some(Arc::clone(semaphore).acquire_owned().await.map_err(
                    |_| ValidationError::Concurrency {
                        details: "Failed to acquire validation semaphore".to_string(),
                    },
                )?),
                None => None,
            };

            let registry = Arc::clone(&self.registry);
            let capture_errors = self.capture_errors;
            let status = self.status.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = validate_document(&registry, document, capture_errors)?;
                if let Some(callback) = &status {
                    callback(&result);
                }
                Ok::<_, ValidationError>(result)
            });

            while let Some(joined) = tasks.try_join_next() {
                results.push(Self::joined(joined)?);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            results.push(Self::joined(joined)?);
        }

        Ok(results)
    }

    fn joined(
        joined: std::result::Result<Result<FileValidationResult>, JoinError>,
    ) -> Result<FileValidationResult> {
        joined.map_err(|e| ValidationError::Concurrency {
            details: format!("Task join error: {e}"),
        })?
    }
}
