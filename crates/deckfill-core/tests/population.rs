//! End-to-end population scenarios against the in-memory gateway

use deckfill_core::{
    diagnostics, CancelFlag, Engine, EngineConfig, GatewayError, MarkerScope, MemoryGateway,
    PopulateError, Step,
};
use deckfill_model::{DocumentSnapshot, PageElement, Shape, Slide, Table};
use serde_json::{json, Value};

fn template() -> DocumentSnapshot {
    DocumentSnapshot::new("tpl")
        .with_title("Company Template")
        .with_slide(Slide::new("cover").with_element(PageElement::Shape(Shape::text_box(
            "title",
            "Welcome to {{company_name}}",
        ))))
        .with_slide(
            Slide::new("team").with_element(PageElement::Table(Table::from_rows(
                "people",
                vec![vec!["{{ARRAY:employees}}name"]],
            ))),
        )
}

fn employees(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({"name": format!("Employee {}", i + 1)}))
            .collect(),
    )
}

fn tables_for(doc: &DocumentSnapshot, key: &str) -> Vec<Table> {
    doc.tables()
        .filter(|(_, _, t)| {
            t.cell_text(0, 0)
                .is_some_and(|text| text.contains(&format!("{{{{ARRAY:{}}}}}", key)))
        })
        .map(|(_, _, t)| t.clone())
        .collect()
}

#[test]
fn test_six_employees_span_two_slides() {
    let gw = MemoryGateway::with_document(template());
    let data = json!({"company_name": "Acme", "employees": employees(6)});

    let outcome = Engine::new(&gw)
        .populate("tpl", "Acme Team", &data, None)
        .expect("population should succeed");

    let stats = &outcome.statistics;
    assert_eq!(stats.count("duplicateObject"), 1);
    assert_eq!(stats.count("deleteObject"), 0);
    assert_eq!(stats.count("insertTableRows"), 6);
    assert_eq!(stats.count("insertText"), 6);
    assert_eq!(stats.count("replaceAllText"), 1);
    assert_eq!(stats.total_batches(), 4);
    assert!(outcome.diagnostics.is_empty());

    let doc = gw.document(&outcome.document_id).unwrap();
    assert_eq!(doc.title.as_deref(), Some("Acme Team"));
    assert_eq!(doc.slide_count(), 3);

    let tables = tables_for(&doc, "employees");
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].row_count(), 6);
    assert_eq!(tables[1].row_count(), 2);
    assert_eq!(tables[0].cell_text(1, 0).as_deref(), Some("Employee 1"));
    assert_eq!(tables[0].cell_text(5, 0).as_deref(), Some("Employee 5"));
    assert_eq!(tables[1].cell_text(1, 0).as_deref(), Some("Employee 6"));

    let texts: Vec<String> = doc.text_runs().map(|r| r.content.clone()).collect();
    assert!(texts.contains(&"Welcome to Acme".to_string()));

    // the template itself is untouched
    assert_eq!(gw.document("tpl").unwrap(), template());
}

#[test]
fn test_empty_array_deletes_its_slide() {
    let gw = MemoryGateway::with_document(template());
    let data = json!({"company_name": "Acme", "employees": []});

    let outcome = Engine::new(&gw)
        .populate("tpl", "Empty", &data, None)
        .unwrap();

    let doc = gw.document(&outcome.document_id).unwrap();
    assert_eq!(doc.slide_count(), 1);
    assert!(doc.slide("team").is_none());
    assert_eq!(outcome.statistics.count("deleteObject"), 1);
    assert_eq!(outcome.statistics.count("insertTableRows"), 0);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_missing_array_key_leaves_table_alone() {
    let template = template().with_slide(Slide::new("projects").with_element(
        PageElement::Table(Table::from_rows(
            "proj",
            vec![vec!["{{ARRAY:projects}}title", "budget"]],
        )),
    ));
    let gw = MemoryGateway::with_document(template);
    let data = json!({
        "company_name": "Acme",
        "projects": [{"title": "Apollo", "budget": 1200}]
    });

    let outcome = Engine::new(&gw)
        .populate("tpl", "Projects", &data, None)
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].has_code(diagnostics::MISSING_ARRAY_KEY));
    assert!(outcome.statistics.batches().iter().all(|b| b.operation_kinds.get("duplicateObject").is_none()));

    let doc = gw.document(&outcome.document_id).unwrap();
    assert_eq!(tables_for(&doc, "employees")[0].row_count(), 1);
    let projects = tables_for(&doc, "projects");
    assert_eq!(projects[0].row_count(), 2);
    assert_eq!(projects[0].cell_text(1, 0).as_deref(), Some("Apollo"));
    assert_eq!(projects[0].cell_text(1, 1).as_deref(), Some("1200"));
}

#[test]
fn test_unresolved_scalar_stays_literal() {
    let gw = MemoryGateway::with_document(template());
    let data = json!({"employees": employees(1)});

    let outcome = Engine::new(&gw)
        .populate("tpl", "No name", &data, None)
        .unwrap();

    assert_eq!(
        outcome
            .diagnostics
            .iter()
            .filter(|d| d.has_code(diagnostics::UNRESOLVED_MARKER))
            .count(),
        1
    );
    let doc = gw.document(&outcome.document_id).unwrap();
    assert!(doc
        .text_runs()
        .any(|r| r.content == "Welcome to {{company_name}}"));
}

#[test]
fn test_small_chunk_bound_splits_cell_batch() {
    let gw = MemoryGateway::with_document(template());
    let data = json!({"company_name": "Acme", "employees": employees(40)});

    let outcome = Engine::new(&gw)
        .with_config(EngineConfig::default().with_max_batch_bytes(2_000))
        .populate("tpl", "Big", &data, None)
        .unwrap();

    let stats = &outcome.statistics;
    assert!(stats.total_batches() > 4);
    assert!(stats.batches().iter().all(|b| b.payload_bytes <= 2_000));
    assert_eq!(stats.count("insertText"), 40);
    assert_eq!(stats.count("duplicateObject"), 7);

    let doc = gw.document(&outcome.document_id).unwrap();
    let tables = tables_for(&doc, "employees");
    assert_eq!(tables.len(), 8);
    let filled: usize = tables.iter().map(|t| t.row_count() - 1).sum();
    assert_eq!(filled, 40);
}

#[test]
fn test_failure_mid_run_keeps_earlier_batches() {
    let gw = MemoryGateway::with_document(template());
    // structural batch is call 0, rows call 1, cells call 2
    gw.fail_mutation(2, GatewayError::Transient("backend unavailable".into()));
    let data = json!({"company_name": "Acme", "employees": employees(6)});

    let err = Engine::new(&gw)
        .populate("tpl", "Broken", &data, None)
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Cells));
    assert!(err.to_string().starts_with("cell population failed"));
    assert_eq!(gw.mutation_log(), vec![1, 6]);

    let doc = gw.document("tpl-copy-1").unwrap();
    let tables = tables_for(&doc, "employees");
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].row_count(), 6);
    assert_eq!(tables[0].cell_text(1, 0).as_deref(), Some(""));
}

#[test]
fn test_cancellation_stops_before_next_call() {
    let gw = MemoryGateway::with_document(template());
    let cancel = CancelFlag::new();
    let engine = Engine::new(&gw).with_cancel(cancel.clone());

    let first = engine
        .populate("tpl", "Once", &json!({"employees": employees(2)}), None)
        .unwrap();
    assert_eq!(first.statistics.total_batches(), 2);

    cancel.cancel();
    let err = engine
        .populate_document(&first.document_id, &json!({"employees": employees(2)}))
        .unwrap_err();
    assert!(matches!(err, PopulateError::Cancelled { step: Step::Fetch }));
    assert_eq!(gw.mutation_log().len(), 2);
}

#[test]
fn test_all_rows_scope_finds_marker_below_header() {
    let template = DocumentSnapshot::new("tpl").with_slide(Slide::new("s").with_element(
        PageElement::Table(Table::from_rows(
            "t",
            vec![vec!["name", "role"], vec!["{{ARRAY:staff}}", ""]],
        )),
    ));
    let data = json!({"staff": [{"name": "Ada", "role": "CTO"}]});

    let header_only = MemoryGateway::with_document(template.clone());
    let outcome = Engine::new(&header_only)
        .populate_document("tpl", &data)
        .unwrap();
    assert_eq!(outcome.statistics.total_batches(), 0);

    let all_rows = MemoryGateway::with_document(template);
    let outcome = Engine::new(&all_rows)
        .with_config(EngineConfig::default().with_marker_scope(MarkerScope::AllRows))
        .populate_document("tpl", &data)
        .unwrap();
    assert_eq!(outcome.statistics.count("insertText"), 2);
    let doc = all_rows.document("tpl").unwrap();
    let (_, _, table) = doc.tables().next().unwrap();
    assert_eq!(table.cell_text(1, 1).as_deref(), Some("CTO"));
}

#[test]
fn test_duplicate_bindings_are_reported() {
    let template = template().with_slide(Slide::new("again").with_element(PageElement::Table(
        Table::from_rows("people2", vec![vec!["{{ARRAY:employees}}name"]]),
    )));
    let gw = MemoryGateway::with_document(template);
    let data = json!({"company_name": "Acme", "employees": employees(2)});

    let outcome = Engine::new(&gw)
        .populate("tpl", "Twice", &data, None)
        .unwrap();

    let codes: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter_map(|d| d.code.as_deref())
        .collect();
    assert!(codes.contains(&diagnostics::DUPLICATE_BINDING));
    assert!(codes.contains(&diagnostics::RECONCILE_MISMATCH));
}

#[test]
fn test_empty_table_keeps_slide_shared_with_larger_table() {
    let template = DocumentSnapshot::new("tpl").with_slide(
        Slide::new("shared")
            .with_element(PageElement::Table(Table::from_rows(
                "managers",
                vec![vec!["{{ARRAY:managers}}name"]],
            )))
            .with_element(PageElement::Table(Table::from_rows(
                "people",
                vec![vec!["{{ARRAY:employees}}name"]],
            ))),
    );
    let gw = MemoryGateway::with_document(template);
    let data = json!({"managers": [], "employees": employees(6)});

    let outcome = Engine::new(&gw)
        .populate("tpl", "Shared", &data, None)
        .expect("tables sharing a slide should populate");

    let stats = &outcome.statistics;
    assert_eq!(stats.count("duplicateObject"), 1);
    assert_eq!(stats.count("deleteObject"), 0);
    assert_eq!(stats.count("insertTableRows"), 6);

    let codes: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter_map(|d| d.code.as_deref())
        .collect();
    assert_eq!(codes, vec![diagnostics::SHARED_SLIDE]);

    let doc = gw.document(&outcome.document_id).unwrap();
    assert_eq!(doc.slide_count(), 2);
    let people = tables_for(&doc, "employees");
    assert_eq!(people.len(), 2);
    assert_eq!(people[0].row_count(), 6);
    assert_eq!(people[1].row_count(), 2);
    assert!(tables_for(&doc, "managers").iter().all(|t| t.row_count() == 1));
}
