//! Decoded API presentations driven through the engine offline

use deckfill_core::{inspect, Engine, MarkerScope, MemoryGateway};
use deckfill_gateway::decode;
use serde_json::json;

const TEMPLATE: &str = include_str!("fixtures/team_template.json");

#[test]
fn test_inspect_decoded_template() {
    let snapshot = decode(TEMPLATE.as_bytes()).expect("fixture should decode");
    let report = inspect(&snapshot, MarkerScope::Header);

    assert_eq!(report.document_id, "1TeamTemplate");
    assert_eq!(report.slide_count, 2);
    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].table_id, "g_team_table");
    assert_eq!(report.tables[0].columns, vec!["name", "role", "age"]);
    assert_eq!(report.scalar_keys, vec!["company_name", "year"]);
}

#[test]
fn test_populate_decoded_template() {
    let snapshot = decode(TEMPLATE.as_bytes()).unwrap();
    let gateway = MemoryGateway::with_document(snapshot);
    let employees: Vec<_> = (1..=11)
        .map(|i| json!({"name": format!("Person {}", i), "role": "Engineer", "age": 20 + i}))
        .collect();
    let data = json!({"company_name": "Acme", "year": 2024, "employees": employees});

    let outcome = Engine::new(&gateway)
        .populate("1TeamTemplate", "Acme 2024", &data, None)
        .expect("population should succeed");

    let stats = &outcome.statistics;
    assert_eq!(stats.count("duplicateObject"), 2);
    assert_eq!(stats.count("insertTableRows"), 11);
    assert_eq!(stats.count("insertText"), 33);
    assert_eq!(stats.count("replaceAllText"), 2);
    assert!(outcome.diagnostics.is_empty());

    let doc = gateway.document(&outcome.document_id).unwrap();
    assert_eq!(doc.slide_count(), 4);
    let last = doc.tables().last().map(|(_, _, t)| t.clone()).unwrap();
    assert_eq!(last.row_count(), 2);
    assert_eq!(last.cell_text(1, 0).as_deref(), Some("Person 11"));
    assert_eq!(last.cell_text(1, 2).as_deref(), Some("31"));
    assert!(doc
        .text_runs()
        .any(|r| r.content == "Acme team review\n"));
}
