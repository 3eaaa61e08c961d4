//! Structural execution and reconciliation
//!
//! Applies the duplicate/delete operations of every plan, then works out
//! which tables of the mutated document realize each plan. Duplicated
//! tables get identities nobody knows in advance, so groups are rebuilt from
//! a fresh snapshot by matching array markers.

use deckfill_model::{DocumentSnapshot, Operation};
use serde::Serialize;

use crate::config::MarkerScope;
use crate::diagnostics::{self, Diagnostic, Diagnostics};
use crate::dispatcher::Dispatcher;
use crate::error::{Result, Step};
use crate::gateway::Gateway;
use crate::planner::{self, PopulationPlan};
use crate::resolver;

/// Batch description of the structural phase
pub const STRUCTURAL_DESCRIPTION: &str = "Structural changes (slide duplication/deletion)";

/// Table instances hosting one array, in slide order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideGroup {
    /// Data key of the group
    pub array_key: String,
    /// Table ids, original first in slide order
    pub table_ids: Vec<String>,
    /// Column labels from the header row of the first instance
    pub columns: Vec<String>,
}

impl SlideGroup {
    /// Number of table instances
    pub fn len(&self) -> usize {
        self.table_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table_ids.is_empty()
    }
}

/// Send the structural operations of all plans
///
/// Returns the number of calls made; zero when no plan changes structure.
pub fn apply_structure<G: Gateway + ?Sized>(
    dispatcher: &mut Dispatcher<'_, G>,
    document_id: &str,
    plans: &[PopulationPlan<'_>],
) -> Result<usize> {
    let operations = planner::structural_ops(plans);
    debug_assert!(operations.iter().all(Operation::is_structural));
    tracing::info!(operations = operations.len(), "applying structural changes");
    dispatcher.dispatch(
        document_id,
        &operations,
        STRUCTURAL_DESCRIPTION,
        Step::Structural,
    )
}

/// Build one slide group per surviving plan from a post-mutation snapshot
///
/// Every table whose marker names the plan's key joins the group. A group
/// whose size differs from the plan is reported and used as found; a key
/// with no tables at all is reported and dropped.
pub fn reconcile(
    snapshot: &DocumentSnapshot,
    plans: &[PopulationPlan<'_>],
    scope: MarkerScope,
    diagnostics: &mut Diagnostics,
) -> Vec<SlideGroup> {
    let bindings = resolver::resolve(snapshot, scope);
    let mut groups = Vec::new();

    for plan in plans.iter().filter(|p| !p.deletes_slide()) {
        let key = plan.array_key();
        let members: Vec<&resolver::Binding> =
            bindings.iter().filter(|b| b.array_key == key).collect();

        let Some(first) = members.first() else {
            diagnostics.push(
                Diagnostic::warning(format!("No tables found for array '{}'", key))
                    .with_code(diagnostics::GROUP_NOT_FOUND)
                    .with_key(key),
            );
            continue;
        };

        if members.len() != plan.instances {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "Expected {} tables for '{}' but found {}",
                    plan.instances,
                    key,
                    members.len()
                ))
                .with_code(diagnostics::RECONCILE_MISMATCH)
                .with_key(key)
                .with_help("rows are written to the tables that were found"),
            );
        }

        let group = SlideGroup {
            array_key: key.to_string(),
            columns: resolver::header_labels(&first.table),
            table_ids: members.iter().map(|b| b.table_id.clone()).collect(),
        };
        tracing::debug!(
            array_key = key,
            tables = group.len(),
            columns = group.columns.len(),
            "reconciled slide group"
        );
        groups.push(group);
    }

    groups
}
