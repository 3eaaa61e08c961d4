//! Batch dispatch
//!
//! Routes operation lists to the gateway under the payload ceiling and keeps
//! the run's [`BatchStatistics`]. Each call is atomic on the remote side;
//! a list split into several chunks is not. When a later chunk fails, the
//! earlier ones stay applied.

use deckfill_model::{DocumentSnapshot, Operation};

use crate::cancel::CancelFlag;
use crate::chunker;
use crate::config::MAX_BATCH_BYTES;
use crate::error::{PopulateError, Result, Step};
use crate::gateway::Gateway;
use crate::stats::BatchStatistics;

/// Sends batches for one population run
pub struct Dispatcher<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    max_batch_bytes: usize,
    cancel: CancelFlag,
    stats: BatchStatistics,
}

impl<'g, G: Gateway + ?Sized> Dispatcher<'g, G> {
    /// Create a dispatcher with an empty statistics record
    pub fn new(gateway: &'g G, max_batch_bytes: usize) -> Self {
        Self {
            gateway,
            max_batch_bytes: max_batch_bytes.min(MAX_BATCH_BYTES),
            cancel: CancelFlag::new(),
            stats: BatchStatistics::default(),
        }
    }

    /// Observe a cancellation flag before every remote call
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// The gateway batches go to
    pub fn gateway(&self) -> &'g G {
        self.gateway
    }

    /// Fetch a fresh snapshot of a document
    pub fn fetch(&self, document_id: &str) -> Result<DocumentSnapshot> {
        self.cancel.ensure_not_cancelled(Step::Fetch)?;
        tracing::debug!(gateway = self.gateway.name(), document_id, "fetching document");
        let snapshot = self
            .gateway
            .fetch(document_id)
            .map_err(|e| PopulateError::gateway(Step::Fetch, e))?;
        tracing::debug!(slides = snapshot.slide_count(), "document fetched");
        Ok(snapshot)
    }

    /// Send `operations`, splitting them into chunks when the whole list is
    /// larger than the chunk bound
    ///
    /// Returns the number of calls made. An empty list makes no call. Every
    /// chunk is checked against the hard ceiling before the first is sent.
    pub fn dispatch(
        &mut self,
        document_id: &str,
        operations: &[Operation],
        description: &str,
        step: Step,
    ) -> Result<usize> {
        if operations.is_empty() {
            tracing::debug!(description, "skipping empty batch");
            return Ok(0);
        }

        let total = chunker::payload_size(operations);
        if total <= self.max_batch_bytes {
            self.send_batch(document_id, operations, description, step)?;
            return Ok(1);
        }

        let chunks = chunker::chunk(operations, self.max_batch_bytes);
        tracing::info!(
            payload_bytes = total,
            limit = self.max_batch_bytes,
            chunks = chunks.len(),
            "{}: splitting batch",
            description
        );

        for c in &chunks {
            let size = chunker::payload_size(c);
            if size > MAX_BATCH_BYTES {
                return Err(PopulateError::PayloadTooLarge {
                    step,
                    size,
                    limit: MAX_BATCH_BYTES,
                });
            }
        }

        let count = chunks.len();
        for (index, c) in chunks.into_iter().enumerate() {
            let label = format!("{} (chunk {}/{})", description, index + 1, count);
            self.send_batch(document_id, c, &label, step)?;
        }
        Ok(count)
    }

    /// Send `operations` as one call, without chunking
    ///
    /// A batch over the hard ceiling fails before anything is transmitted.
    pub fn send_batch(
        &mut self,
        document_id: &str,
        operations: &[Operation],
        description: &str,
        step: Step,
    ) -> Result<()> {
        let size = chunker::payload_size(operations);
        if size > MAX_BATCH_BYTES {
            return Err(PopulateError::PayloadTooLarge {
                step,
                size,
                limit: MAX_BATCH_BYTES,
            });
        }
        self.cancel.ensure_not_cancelled(step)?;

        tracing::debug!(
            gateway = self.gateway.name(),
            document_id,
            requests = operations.len(),
            payload_bytes = size,
            "{}",
            description
        );
        self.gateway
            .mutate(document_id, operations)
            .map_err(|e| PopulateError::gateway(step, e))?;

        self.stats.record(description, operations, size);
        Ok(())
    }

    /// Statistics recorded so far
    pub fn statistics(&self) -> &BatchStatistics {
        &self.stats
    }

    /// Finish and hand the statistics to the caller
    pub fn into_statistics(self) -> BatchStatistics {
        self.stats
    }
}
