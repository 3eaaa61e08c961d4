//! Template inspection and dry runs

use serde::Serialize;
use serde_json::Value;

use deckfill_model::DocumentSnapshot;

use crate::config::{EngineConfig, MarkerScope};
use crate::diagnostics::Diagnostics;
use crate::engine::{Engine, Outcome};
use crate::error::{PopulateError, Result};
use crate::memory::MemoryGateway;
use crate::planner;
use crate::resolver;
use crate::scalar;

/// What a template offers for population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateReport {
    pub document_id: String,
    pub title: Option<String>,
    pub slide_count: usize,
    /// Bound tables, in slide order
    pub tables: Vec<TableReport>,
    /// Scalar marker keys, in order of first appearance
    pub scalar_keys: Vec<String>,
}

/// One bound table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub slide_index: usize,
    pub slide_id: String,
    pub table_id: String,
    pub array_key: String,
    pub columns: Vec<String>,
}

/// Describe the markers and bound tables of `snapshot`
pub fn inspect(snapshot: &DocumentSnapshot, scope: MarkerScope) -> TemplateReport {
    let tables = resolver::resolve(snapshot, scope)
        .into_iter()
        .map(|b| TableReport {
            columns: resolver::header_labels(&b.table),
            slide_index: b.slide_index,
            slide_id: b.slide_id,
            table_id: b.table_id,
            array_key: b.array_key,
        })
        .collect();

    TemplateReport {
        document_id: snapshot.document_id.clone(),
        title: snapshot.title.clone(),
        slide_count: snapshot.slide_count(),
        tables,
        scalar_keys: scalar::document_keys(snapshot),
    }
}

/// Pagination decided for one array key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub array_key: String,
    pub slide_id: String,
    pub item_count: usize,
    pub slides_needed: usize,
    pub deletes_slide: bool,
}

/// Everything a run would do, computed without touching the real document
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub plans: Vec<PlanSummary>,
    /// Outcome of the run against a private copy of the snapshot
    pub outcome: Outcome,
    /// The copy after population
    pub result: DocumentSnapshot,
}

/// Run the engine against an in-memory copy of `snapshot`
pub fn preview(config: &EngineConfig, snapshot: &DocumentSnapshot, data: &Value) -> Result<Preview> {
    let fields = data
        .as_object()
        .ok_or_else(|| PopulateError::invalid_data("input data must be a JSON object"))?;

    // diagnostics of this pass repeat in the outcome
    let mut scratch = Diagnostics::new();
    let bindings = resolver::resolve(snapshot, config.marker_scope);
    let plans = planner::plan_all(&bindings, fields, config.items_per_slide.max(1), &mut scratch)
        .into_iter()
        .map(|p| PlanSummary {
            array_key: p.array_key().to_string(),
            slide_id: p.binding.slide_id.clone(),
            item_count: p.item_count(),
            slides_needed: p.slides_needed,
            deletes_slide: p.instances == 0,
        })
        .collect();

    let gateway = MemoryGateway::with_document(snapshot.clone());
    let outcome = Engine::new(&gateway)
        .with_config(config.clone())
        .populate_document(&snapshot.document_id, data)?;
    let result = gateway
        .document(&snapshot.document_id)
        .unwrap_or_else(|| snapshot.clone());

    Ok(Preview {
        plans,
        outcome,
        result,
    })
}
