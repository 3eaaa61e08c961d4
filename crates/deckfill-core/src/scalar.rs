//! Scalar substitution
//!
//! One document-wide, case-sensitive replace-all per scalar key that
//! appears in the document and exists in the data. Keys without a value stay
//! in the document as written.

use std::collections::HashSet;

use deckfill_model::{DocumentSnapshot, Operation};
use serde_json::{Map, Value};

use crate::diagnostics::{self, Diagnostic, Diagnostics};
use crate::marker;
use crate::rows;

/// Batch description of the scalar phase
pub const SCALAR_DESCRIPTION: &str = "Text replacement for placeholders";

/// Replace-all operations for every scalar marker in `snapshot`
pub fn build(
    snapshot: &DocumentSnapshot,
    data: &Map<String, Value>,
    diagnostics: &mut Diagnostics,
) -> Vec<Operation> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut operations = Vec::new();

    for run in snapshot.text_runs() {
        for key in marker::scalar_keys(&run.content) {
            if !seen.insert(key.to_string()) {
                continue;
            }
            match data.get(key) {
                Some(value) => {
                    operations.push(Operation::replace_all(
                        marker::marker_for(key),
                        rows::render(value),
                    ));
                }
                None => diagnostics.push(
                    Diagnostic::info(format!("No data for placeholder '{{{{{}}}}}'", key))
                        .with_code(diagnostics::UNRESOLVED_MARKER)
                        .with_key(key),
                ),
            }
        }
    }

    tracing::debug!(operations = operations.len(), "built text replacements");
    operations
}

/// Distinct scalar marker keys of a document, in order of first appearance
pub fn document_keys(snapshot: &DocumentSnapshot) -> Vec<String> {
    let mut seen = HashSet::new();
    snapshot
        .text_runs()
        .flat_map(|run| marker::scalar_keys(&run.content))
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckfill_model::{PageElement, Shape, Slide, Table};
    use serde_json::json;

    fn deck() -> DocumentSnapshot {
        DocumentSnapshot::new("d")
            .with_slide(
                Slide::new("s1")
                    .with_element(PageElement::Shape(Shape::text_box(
                        "title",
                        "{{company_name}} report {{year}}",
                    )))
                    .with_element(PageElement::Shape(Shape::text_box(
                        "footer",
                        "(c) {{company_name}} {{unknown}}",
                    ))),
            )
            .with_slide(Slide::new("s2").with_element(PageElement::Table(Table::from_rows(
                "t",
                vec![vec!["{{ARRAY:employees}}name", "{{currency}}"]],
            ))))
    }

    #[test]
    fn test_one_operation_per_key() {
        let data = json!({"company_name": "Acme", "year": 2024, "currency": "EUR"});
        let mut diags = Diagnostics::new();
        let ops = build(&deck(), data.as_object().unwrap(), &mut diags);

        assert_eq!(
            ops,
            vec![
                Operation::replace_all("{{company_name}}", "Acme"),
                Operation::replace_all("{{year}}", "2024"),
                Operation::replace_all("{{currency}}", "EUR"),
            ]
        );
        assert_eq!(diags.count_code(diagnostics::UNRESOLVED_MARKER), 1);
    }

    #[test]
    fn test_array_markers_are_not_scalars() {
        let data = json!({"employees": [1, 2]});
        let mut diags = Diagnostics::new();
        let ops = build(&deck(), data.as_object().unwrap(), &mut diags);
        assert!(ops.is_empty());
        assert!(diags.iter().all(|d| d.key.as_deref() != Some("employees")));
    }

    #[test]
    fn test_document_keys() {
        assert_eq!(
            document_keys(&deck()),
            vec!["company_name", "year", "unknown", "currency"]
        );
    }
}
