//! Population engine
//!
//! Entry point of a run. Drives the phases in a fixed order, each through
//! the dispatcher so every call is chunked, size-checked and counted:
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────────┐   ┌──────┐   ┌───────┐   ┌────────┐
//! │ copy     │──▶│ resolve │──▶│ structural │──▶│ rows │──▶│ cells │──▶│ scalar │
//! │ (+ move) │   │ + plan  │   │ + reconcile│   │      │   │       │   │        │
//! └──────────┘   └─────────┘   └────────────┘   └──────┘   └───────┘   └────────┘
//! ```
//!
//! Nothing is retried and nothing is rolled back. A failure ends the run
//! with the step that failed; whatever earlier calls applied stays applied.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cancel::CancelFlag;
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dispatcher::Dispatcher;
use crate::error::{PopulateError, Result, Step};
use crate::executor;
use crate::gateway::{self, Gateway};
use crate::planner;
use crate::resolver;
use crate::rows::{self, TableRequests};
use crate::scalar;
use crate::stats::BatchStatistics;

/// Batch description of the row phase
pub const ROWS_DESCRIPTION: &str = "Insert table rows for all tables";

/// Batch description of the cell phase
pub const CELLS_DESCRIPTION: &str = "Populate table cells for all tables";

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// The populated document
    pub document_id: String,
    /// Every batch-update call made
    pub statistics: BatchStatistics,
    /// Non-fatal anomalies, in the order they were found
    pub diagnostics: Vec<Diagnostic>,
}

/// Populates documents through a gateway
pub struct Engine<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    config: EngineConfig,
    cancel: CancelFlag,
}

impl<'g, G: Gateway + ?Sized> Engine<'g, G> {
    /// Create an engine with default settings
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            config: EngineConfig::default(),
            cancel: CancelFlag::new(),
        }
    }

    /// Use `config` for every run
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop runs when `cancel` is set
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Settings in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Copy `template_id` into a new document titled `title`, optionally
    /// file it into `folder` (an id or a Drive folder URL), and populate it
    /// with `data`
    pub fn populate(
        &self,
        template_id: &str,
        title: &str,
        data: &Value,
        folder: Option<&str>,
    ) -> Result<Outcome> {
        self.config.validate()?;
        let fields = data_object(data)?;
        let folder = folder
            .map(|f| {
                gateway::folder_id(f)
                    .ok_or_else(|| PopulateError::invalid_data(format!("invalid folder '{}'", f)))
            })
            .transpose()?;

        self.cancel.ensure_not_cancelled(Step::Copy)?;
        tracing::info!(gateway = self.gateway.name(), template_id, title, "copying template");
        let document_id = self
            .gateway
            .copy(template_id, title)
            .map_err(|e| PopulateError::gateway(Step::Copy, e))?;
        tracing::info!(document_id = %document_id, "template copied");

        if let Some(folder) = folder {
            self.cancel.ensure_not_cancelled(Step::Move)?;
            tracing::info!(document_id = %document_id, folder = %folder, "moving document");
            self.gateway
                .move_to_folder(&document_id, &folder)
                .map_err(|e| PopulateError::gateway(Step::Move, e))?;
        }

        self.run(&document_id, fields)
    }

    /// Populate an existing document in place
    pub fn populate_document(&self, document_id: &str, data: &Value) -> Result<Outcome> {
        self.config.validate()?;
        let fields = data_object(data)?;
        self.run(document_id, fields)
    }

    fn run(&self, document_id: &str, data: &Map<String, Value>) -> Result<Outcome> {
        let scope = self.config.marker_scope;
        let mut dispatcher = Dispatcher::new(self.gateway, self.config.max_batch_bytes)
            .with_cancel(self.cancel.clone());
        let mut diagnostics = Diagnostics::new();

        let snapshot = dispatcher.fetch(document_id)?;
        let bindings = resolver::resolve(&snapshot, scope);
        tracing::info!(bindings = bindings.len(), "resolved table bindings");
        let plans = planner::plan_all(
            &bindings,
            data,
            self.config.items_per_slide,
            &mut diagnostics,
        );

        let structural_calls = executor::apply_structure(&mut dispatcher, document_id, &plans)?;
        let current = if structural_calls > 0 {
            dispatcher.fetch(document_id)?
        } else {
            snapshot
        };
        let groups = executor::reconcile(&current, &plans, scope, &mut diagnostics);

        let mut requests = TableRequests::default();
        for group in &groups {
            if let Some(plan) = plans.iter().find(|p| p.array_key() == group.array_key) {
                requests.extend(rows::build(group, plan));
            }
        }
        tracing::info!(
            rows = requests.rows.len(),
            cells = requests.cells.len(),
            "populating tables"
        );
        dispatcher.dispatch(document_id, &requests.rows, ROWS_DESCRIPTION, Step::Rows)?;
        dispatcher.dispatch(document_id, &requests.cells, CELLS_DESCRIPTION, Step::Cells)?;

        let replacements = scalar::build(&current, data, &mut diagnostics);
        tracing::info!(replacements = replacements.len(), "substituting placeholders");
        dispatcher.dispatch(
            document_id,
            &replacements,
            scalar::SCALAR_DESCRIPTION,
            Step::Scalar,
        )?;

        let statistics = dispatcher.into_statistics();
        tracing::info!(
            document_id,
            batches = statistics.total_batches(),
            operations = statistics.total_operations(),
            "population complete"
        );
        Ok(Outcome {
            document_id: document_id.to_string(),
            statistics,
            diagnostics: diagnostics.into_vec(),
        })
    }
}

fn data_object(data: &Value) -> Result<&Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| PopulateError::invalid_data("input data must be a JSON object"))
}
