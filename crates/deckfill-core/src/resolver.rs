//! Table binding resolution
//!
//! Finds the tables of a snapshot that carry a `{{ARRAY:key}}` marker and
//! binds each to its array key.

use deckfill_model::{DocumentSnapshot, Table, TableRow};

use crate::config::MarkerScope;
use crate::marker;

/// A table bound to an array-valued data key
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Slide hosting the table
    pub slide_id: String,
    /// Position of that slide in the snapshot
    pub slide_index: usize,
    /// Table object id
    pub table_id: String,
    /// Data key named by the marker
    pub array_key: String,
    /// The table as it was in the snapshot
    pub table: Table,
}

/// Bind every marked table of `snapshot`, in slide order then element order
pub fn resolve(snapshot: &DocumentSnapshot, scope: MarkerScope) -> Vec<Binding> {
    snapshot
        .tables()
        .filter_map(|(slide_index, slide, table)| {
            let array_key = table_array_key(table, scope)?;
            Some(Binding {
                slide_id: slide.object_id.clone(),
                slide_index,
                table_id: table.object_id.clone(),
                array_key: array_key.to_string(),
                table: table.clone(),
            })
        })
        .collect()
}

/// The first array key found in the scanned rows of `table`
pub fn table_array_key(table: &Table, scope: MarkerScope) -> Option<String> {
    let rows: &[TableRow] = match scope {
        MarkerScope::Header => table.rows.get(..1).unwrap_or(&[]),
        MarkerScope::AllRows => &table.rows,
    };
    rows.iter()
        .flat_map(|row| row.cells.iter())
        .find_map(|cell| marker::first_array_key(&cell.text()).map(str::to_string))
}

/// Column labels from the header row, binding markers removed
pub fn header_labels(table: &Table) -> Vec<String> {
    table
        .header()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| marker::header_label(&cell.text()))
                .collect()
        })
        .unwrap_or_default()
}
