//! Document gateway abstraction
//!
//! The engine never talks to a document service directly. Everything it
//! needs from the remote side goes through [`Gateway`], which keeps the
//! engine testable against the in-memory implementation and lets the HTTP
//! client live in its own crate.

use std::sync::OnceLock;

use deckfill_model::{DocumentSnapshot, Operation};
use regex::Regex;

use crate::error::{GatewayError, GatewayResult};

/// Transactional access to remote presentations
///
/// Implementations own timeouts and retries; the engine treats every call as
/// either succeeded or failed.
pub trait Gateway {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Copy a template into a new document titled `title`, returning its id
    fn copy(&self, template_id: &str, title: &str) -> GatewayResult<String>;

    /// Fetch a fresh snapshot of a document
    fn fetch(&self, document_id: &str) -> GatewayResult<DocumentSnapshot>;

    /// Apply all operations atomically, or none of them
    fn mutate(&self, document_id: &str, operations: &[Operation]) -> GatewayResult<()>;

    /// File a document into a folder
    fn move_to_folder(&self, document_id: &str, folder_id: &str) -> GatewayResult<()> {
        let _ = (document_id, folder_id);
        Err(GatewayError::Unsupported(format!(
            "{} cannot move documents between folders",
            self.name()
        )))
    }
}

/// Extract a folder id from a Drive folder URL or a bare id
///
/// ```
/// use deckfill_core::gateway::folder_id;
///
/// assert_eq!(
///     folder_id("https://drive.google.com/drive/folders/1AbC_d-9?usp=sharing").as_deref(),
///     Some("1AbC_d-9")
/// );
/// assert_eq!(folder_id("1AbC_d-9").as_deref(), Some("1AbC_d-9"));
/// assert_eq!(folder_id("https://example.com/nothing"), None);
/// ```
pub fn folder_id(input: &str) -> Option<String> {
    static FOLDER_RE: OnceLock<Regex> = OnceLock::new();
    static BARE_RE: OnceLock<Regex> = OnceLock::new();

    let folder_re = FOLDER_RE.get_or_init(|| {
        // .../folders/<id> or ...?id=<id>
        Regex::new(r"(?:/folders/|[?&]id=)([A-Za-z0-9_-]+)").unwrap()
    });
    let bare_re = BARE_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

    let input = input.trim();
    if bare_re.is_match(input) {
        return Some(input.to_string());
    }
    folder_re
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl Gateway for ReadOnly {
        fn name(&self) -> &str {
            "read-only"
        }

        fn copy(&self, _template_id: &str, _title: &str) -> GatewayResult<String> {
            Err(GatewayError::PermissionDenied("read-only".into()))
        }

        fn fetch(&self, document_id: &str) -> GatewayResult<DocumentSnapshot> {
            Ok(DocumentSnapshot::new(document_id))
        }

        fn mutate(&self, _document_id: &str, _operations: &[Operation]) -> GatewayResult<()> {
            Err(GatewayError::PermissionDenied("read-only".into()))
        }
    }

    #[test]
    fn test_move_defaults_to_unsupported() {
        let err = ReadOnly.move_to_folder("doc", "folder").unwrap_err();
        assert_eq!(err.code(), "GW008");
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_folder_id_forms() {
        assert_eq!(
            folder_id("https://drive.google.com/drive/u/0/folders/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            folder_id("https://drive.google.com/open?id=xyz_9").as_deref(),
            Some("xyz_9")
        );
        assert_eq!(folder_id("  raw-id  ").as_deref(), Some("raw-id"));
        assert_eq!(folder_id(""), None);
    }
}
