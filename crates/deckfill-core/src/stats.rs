//! Batch statistics
//!
//! Counters for the batch-update calls of one population run. Only the
//! dispatcher records into them; callers get a finished value back.

use std::collections::BTreeMap;
use std::fmt;

use deckfill_model::Operation;
use serde::{Deserialize, Serialize};

/// One successful batch-update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// 1-based position among all calls of the run
    pub number: usize,
    /// What the batch was for
    pub description: String,
    /// Operations in the batch
    pub operation_count: usize,
    /// Operations by kind
    pub operation_kinds: BTreeMap<String, usize>,
    /// Serialized payload size
    pub payload_bytes: usize,
}

/// Accumulated statistics of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatistics {
    total_batches: usize,
    total_operations: usize,
    operations_by_kind: BTreeMap<String, usize>,
    batches: Vec<BatchRecord>,
}

impl BatchStatistics {
    /// Number of batch-update calls made
    pub fn total_batches(&self) -> usize {
        self.total_batches
    }

    /// Number of operations sent
    pub fn total_operations(&self) -> usize {
        self.total_operations
    }

    /// Operations sent, by kind
    pub fn operations_by_kind(&self) -> &BTreeMap<String, usize> {
        &self.operations_by_kind
    }

    /// Operations sent of one kind (`"insertText"`, ...)
    pub fn count(&self, kind: &str) -> usize {
        self.operations_by_kind.get(kind).copied().unwrap_or(0)
    }

    /// Every call in order
    pub fn batches(&self) -> &[BatchRecord] {
        &self.batches
    }

    /// Total bytes sent
    pub fn total_bytes(&self) -> usize {
        self.batches.iter().map(|b| b.payload_bytes).sum()
    }

    pub(crate) fn record(
        &mut self,
        description: &str,
        operations: &[Operation],
        payload_bytes: usize,
    ) {
        let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
        for op in operations {
            *kinds.entry(op.kind().to_string()).or_default() += 1;
        }
        for (kind, count) in &kinds {
            *self.operations_by_kind.entry(kind.clone()).or_default() += count;
        }

        self.total_batches += 1;
        self.total_operations += operations.len();
        self.batches.push(BatchRecord {
            number: self.total_batches,
            description: description.to_string(),
            operation_count: operations.len(),
            operation_kinds: kinds,
            payload_bytes,
        });
    }
}

impl fmt::Display for BatchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "BATCH UPDATE SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total batch updates: {}", self.total_batches)?;
        writeln!(f, "Total requests: {}", self.total_operations)?;
        writeln!(f)?;
        writeln!(f, "Operations by type:")?;
        for (kind, count) in &self.operations_by_kind {
            writeln!(f, "  - {}: {}", kind, count)?;
        }
        writeln!(f)?;
        writeln!(f, "Batches:")?;
        writeln!(f, "{}", "-".repeat(60))?;
        for batch in &self.batches {
            writeln!(f, "#{}: {}", batch.number, batch.description)?;
            writeln!(f, "  requests: {}", batch.operation_count)?;
            writeln!(f, "  payload:  {} bytes", batch.payload_bytes)?;
            let kinds: Vec<String> = batch
                .operation_kinds
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            writeln!(f, "  operations: {}", kinds.join(", "))?;
        }
        write!(f, "{}", rule)
    }
}
