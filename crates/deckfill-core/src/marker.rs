//! Marker parsing
//!
//! Templates carry two kinds of `{{...}}` markers:
//!
//! - `{{key}}`: a scalar marker, replaced with the value of `key`
//! - `{{ARRAY:key}}`: a table-binding marker, placed in a table header to
//!   bind the table to the array stored under `key`
//!
//! A key is one or more characters other than `}`. Parsing is pure and never
//! touches its input.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Prefix that turns a marker into a table-binding marker
pub const ARRAY_PREFIX: &str = "ARRAY:";

/// What a marker binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Text substitution from a top-level data value
    Scalar,
    /// Table binding to an array-valued data key
    Array,
}

/// A marker found in a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    /// Data key, without the array prefix
    pub key: &'a str,
    /// Marker kind
    pub kind: MarkerKind,
    /// Byte offset of the opening braces
    pub start: usize,
    /// Byte offset just past the closing braces
    pub end: usize,
}

impl Marker<'_> {
    /// The marker exactly as it appears in a template
    pub fn literal(&self) -> String {
        match self.kind {
            MarkerKind::Scalar => marker_for(self.key),
            MarkerKind::Array => array_marker_for(self.key),
        }
    }
}

fn marker_re() -> &'static Regex {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    MARKER_RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap())
}

/// Every marker in `text`, left to right
///
/// Array markers with an empty key (`{{ARRAY:}}`) are ignored.
pub fn markers(text: &str) -> Vec<Marker<'_>> {
    marker_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?.as_str();
            let (key, kind) = match inner.strip_prefix(ARRAY_PREFIX) {
                Some("") => return None,
                Some(key) => (key, MarkerKind::Array),
                None => (inner, MarkerKind::Scalar),
            };
            Some(Marker {
                key,
                kind,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// The set of keys referenced by markers in `text`
///
/// ```
/// use deckfill_core::marker::marker_keys;
///
/// let keys = marker_keys("Revenue: {{total_revenue}}");
/// assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["total_revenue"]);
/// assert!(marker_keys("no markers here").is_empty());
/// ```
pub fn marker_keys(text: &str) -> BTreeSet<String> {
    markers(text).into_iter().map(|m| m.key.to_string()).collect()
}

/// Keys of the scalar markers in `text`, in order of appearance
pub fn scalar_keys(text: &str) -> impl Iterator<Item = &str> {
    markers(text)
        .into_iter()
        .filter(|m| m.kind == MarkerKind::Scalar)
        .map(|m| m.key)
}

/// Key of the first table-binding marker in `text`
pub fn first_array_key(text: &str) -> Option<&str> {
    markers(text)
        .into_iter()
        .find(|m| m.kind == MarkerKind::Array)
        .map(|m| m.key)
}

/// Canonical scalar marker for `key`
pub fn marker_for(key: &str) -> String {
    format!("{{{{{}}}}}", key)
}

/// Canonical table-binding marker for `key`
pub fn array_marker_for(key: &str) -> String {
    format!("{{{{{}{}}}}}", ARRAY_PREFIX, key)
}

/// Per-cell marker `{{array_row_column}}` for row/column template expansion
pub fn cell_marker(array_key: &str, row_index: usize, column_label: &str) -> String {
    marker_for(&format!("{}_{}_{}", array_key, row_index, column_label))
}

/// Header label of a cell: its text without table-binding markers, trimmed
pub fn header_label(text: &str) -> String {
    let mut label = String::with_capacity(text.len());
    let mut cursor = 0;
    for marker in markers(text) {
        if marker.kind == MarkerKind::Array {
            label.push_str(&text[cursor..marker.start]);
            cursor = marker.end;
        }
    }
    label.push_str(&text[cursor..]);
    label.trim().to_string()
}
