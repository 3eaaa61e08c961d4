//! deckfill-model - Presentation snapshot and operation types
//!
//! This crate provides the types shared by every deckfill crate: the
//! immutable [`DocumentSnapshot`] tree fetched from the remote document
//! service, and the closed [`Operation`] variant sent back to it in batch
//! updates.

pub mod operation;
pub mod snapshot;

pub use operation::{CellLocation, Operation, TextMatch};
pub use snapshot::{DocumentSnapshot, PageElement, Shape, Slide, Table, TableCell, TableRow, TextRun};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
