//! # deckfill-core
//!
//! Template population engine. Copies a template deck, expands every table
//! bound with `{{ARRAY:key}}` into as many slides as its array needs, fills
//! the rows, and replaces `{{key}}` markers, all through batched updates
//! under the remote payload ceiling.
//!
//! ## Example
//!
//! ```
//! use deckfill_core::{Engine, MemoryGateway};
//! use deckfill_model::{DocumentSnapshot, PageElement, Shape, Slide, Table};
//! use serde_json::json;
//!
//! let template = DocumentSnapshot::new("template").with_slide(
//!     Slide::new("team")
//!         .with_element(PageElement::Shape(Shape::text_box("title", "{{company_name}}")))
//!         .with_element(PageElement::Table(Table::from_rows(
//!             "people",
//!             vec![vec!["{{ARRAY:employees}}name"]],
//!         ))),
//! );
//! let gateway = MemoryGateway::with_document(template);
//!
//! let data = json!({
//!     "company_name": "Acme",
//!     "employees": [{"name": "Ada"}, {"name": "Grace"}]
//! });
//! let outcome = Engine::new(&gateway).populate("template", "Team", &data, None)?;
//!
//! assert_eq!(outcome.statistics.count("insertTableRows"), 2);
//! # Ok::<(), deckfill_core::PopulateError>(())
//! ```

pub mod cancel;
pub mod chunker;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod marker;
pub mod memory;
pub mod planner;
pub mod report;
pub mod resolver;
pub mod rows;
pub mod scalar;
pub mod stats;

pub use cancel::CancelFlag;
pub use chunker::{chunk, payload_size, BatchEnvelope};
pub use config::{EngineConfig, MarkerScope, DEFAULT_ITEMS_PER_SLIDE, MAX_BATCH_BYTES};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use dispatcher::Dispatcher;
pub use engine::{Engine, Outcome};
pub use error::{ConfigError, GatewayError, GatewayResult, PopulateError, Result, Step};
pub use executor::SlideGroup;
pub use gateway::{folder_id, Gateway};
pub use memory::MemoryGateway;
pub use planner::PopulationPlan;
pub use report::{inspect, preview, PlanSummary, Preview, TableReport, TemplateReport};
pub use resolver::Binding;
pub use stats::{BatchRecord, BatchStatistics};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
