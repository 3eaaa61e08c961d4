//! Remote mutation operations
//!
//! Each variant serializes to exactly one entry of a batch-update request
//! list, in the remote API's camelCase shape:
//!
//! ```text
//! {"duplicateObject":{"objectId":"slide_1"}}
//! {"replaceAllText":{"containsText":{"text":"{{name}}","matchCase":true},"replaceText":"Acme"}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// One unit of remote mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Duplicate an object; the copy gets a new identity chosen remotely
    #[serde(rename_all = "camelCase")]
    DuplicateObject { object_id: String },

    /// Delete an object
    #[serde(rename_all = "camelCase")]
    DeleteObject { object_id: String },

    /// Insert empty rows next to an anchor cell
    #[serde(rename_all = "camelCase")]
    InsertTableRows {
        table_object_id: String,
        cell_location: CellLocation,
        insert_below: bool,
        number: u32,
    },

    /// Insert text into a shape or a table cell
    #[serde(rename_all = "camelCase")]
    InsertText {
        object_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cell_location: Option<CellLocation>,
        text: String,
        insertion_index: u32,
    },

    /// Replace every occurrence of a text across the whole document
    #[serde(rename_all = "camelCase")]
    ReplaceAllText {
        contains_text: TextMatch,
        replace_text: String,
    },
}

/// Zero-based table cell address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellLocation {
    pub row_index: u32,
    pub column_index: u32,
}

/// Search criteria of a replace-all operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMatch {
    pub text: String,
    pub match_case: bool,
}

impl CellLocation {
    /// Create a cell address
    pub fn new(row_index: u32, column_index: u32) -> Self {
        Self {
            row_index,
            column_index,
        }
    }
}

impl Operation {
    /// Duplicate a slide (or any other object)
    pub fn duplicate(object_id: impl Into<String>) -> Self {
        Self::DuplicateObject {
            object_id: object_id.into(),
        }
    }

    /// Delete a slide (or any other object)
    pub fn delete(object_id: impl Into<String>) -> Self {
        Self::DeleteObject {
            object_id: object_id.into(),
        }
    }

    /// Insert one empty row directly below the header row of a table
    pub fn insert_row_below_header(table_object_id: impl Into<String>) -> Self {
        Self::InsertTableRows {
            table_object_id: table_object_id.into(),
            cell_location: CellLocation::new(0, 0),
            insert_below: true,
            number: 1,
        }
    }

    /// Write text at the start of a table cell
    pub fn set_cell_text(
        table_object_id: impl Into<String>,
        location: CellLocation,
        text: impl Into<String>,
    ) -> Self {
        Self::InsertText {
            object_id: table_object_id.into(),
            cell_location: Some(location),
            text: text.into(),
            insertion_index: 0,
        }
    }

    /// Case-sensitive replace-all across the document
    pub fn replace_all(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::ReplaceAllText {
            contains_text: TextMatch {
                text: needle.into(),
                match_case: true,
            },
            replace_text: replacement.into(),
        }
    }

    /// Request kind as named on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateObject { .. } => "duplicateObject",
            Self::DeleteObject { .. } => "deleteObject",
            Self::InsertTableRows { .. } => "insertTableRows",
            Self::InsertText { .. } => "insertText",
            Self::ReplaceAllText { .. } => "replaceAllText",
        }
    }

    /// Whether the operation changes document topology
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::DuplicateObject { .. } | Self::DeleteObject { .. })
    }

    /// The object the operation is addressed to, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::DuplicateObject { object_id }
            | Self::DeleteObject { object_id }
            | Self::InsertText { object_id, .. } => Some(object_id),
            Self::InsertTableRows {
                table_object_id, ..
            } => Some(table_object_id),
            Self::ReplaceAllText { .. } => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(target) => write!(f, "{}({})", self.kind(), target),
            None => write!(f, "{}", self.kind()),
        }
    }
}
