//! Bounded producer
//!
//! A single task reads documents from disk in feed order and pushes them
//! into a capacity-bounded channel. When the channel is full the push waits
//! for a worker to take an item, which caps the number of decoded documents
//! in memory regardless of corpus size.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::document::Document;
use crate::error::{Result, ValidationError};

/// Streams documents from an ordered path list into a bounded queue.
#[derive(Debug, Clone)]
pub struct Feeder {
    paths: Vec<PathBuf>,
}

impl Feeder {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// `min(buffer_capacity, number of documents)`, never zero.
    pub fn queue_capacity(&self, buffer_capacity: usize) -> usize {
        buffer_capacity.min(self.paths.len()).max(1)
    }

    /// Start feeding on a dedicated task.
    ///
    /// The returned receiver yields documents in path order and closes once
    /// the last one has been pushed. The handle resolves to the number of
    /// documents fed, or to the first load error, which ends feeding early.
    pub fn spawn(
        self,
        buffer_capacity: usize,
    ) -> (JoinHandle<Result<usize>>, mpsc::Receiver<Document>) {
        let capacity = self.queue_capacity(buffer_capacity);
        let (tx, rx) = mpsc::channel(capacity);

        let handle = tokio::spawn(async move {
            tracing::debug!(documents = self.paths.len(), capacity, "feeder started");

            let mut fed = 0;
            for path in &self.paths {
                let document = Document::load(path).await?;
                tx.send(document)
                    .await
                    .map_err(|_| ValidationError::Concurrency {
                        details: "document queue closed before feeding finished".to_string(),
                    })?;
                fed += 1;
            }

            // dropping the sender is the end-of-input signal
            drop(tx);
            tracing::debug!(fed, "feeder finished");
            Ok::<_, ValidationError>(fed)
        });

        (handle, rx)
    }
}
