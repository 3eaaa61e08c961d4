//! Payload sizing and chunking
//!
//! A batch is sent as `{"requests":[op,op,...]}` in compact JSON. Its size
//! is the envelope plus every operation plus one comma between neighbours,
//! which lets chunking add operations one at a time without re-serializing
//! the whole chunk.

use deckfill_model::Operation;
use serde::Serialize;

/// Body of one batch-update call
#[derive(Debug, Serialize)]
pub struct BatchEnvelope<'a> {
    /// Operations in execution order
    pub requests: &'a [Operation],
}

/// Bytes of `{"requests":[]}`
const ENVELOPE_BYTES: usize = r#"{"requests":[]}"#.len();

/// Serialized size of a single operation
///
/// # Panics
///
/// Never in practice: operations hold only strings, integers and booleans
/// with derived `Serialize` impls, which serialize to JSON infallibly.
pub fn operation_size(operation: &Operation) -> usize {
    serde_json::to_vec(operation)
        .expect("operations contain only strings, integers and booleans")
        .len()
}

/// Serialized size of the batch envelope holding `operations`
///
/// Deterministic, and never smaller for a longer list. Infallible for the
/// same reason as [`operation_size`].
pub fn payload_size(operations: &[Operation]) -> usize {
    serde_json::to_vec(&BatchEnvelope {
        requests: operations,
    })
    .expect("operations contain only strings, integers and booleans")
    .len()
}

/// Split `operations` into the fewest contiguous runs of at most
/// `max_bytes` each
///
/// Packing is greedy from left to right. An operation that is larger than
/// `max_bytes` on its own becomes a single-operation chunk; operations are
/// never split.
pub fn chunk(operations: &[Operation], max_bytes: usize) -> Vec<&[Operation]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut current = ENVELOPE_BYTES;

    for (index, operation) in operations.iter().enumerate() {
        let size = operation_size(operation);
        if index == start {
            current = ENVELOPE_BYTES + size;
            continue;
        }
        // one comma separates it from the previous operation
        let grown = current + 1 + size;
        if grown > max_bytes {
            chunks.push(&operations[start..index]);
            start = index;
            current = ENVELOPE_BYTES + size;
        } else {
            current = grown;
        }
    }

    if start < operations.len() {
        chunks.push(&operations[start..]);
    }
    chunks
}
