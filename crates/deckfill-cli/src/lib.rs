//! deckfill CLI - Command-line interface library
//!
//! This library provides the CLI functionality for deckfill:
//! - Populate: copy a template and fill it with JSON data
//! - Inspect: list the bound tables and placeholders of a template
//! - Plan: dry-run a population against an exported presentation
//!
//! # Binary Usage
//!
//! ```bash
//! # Populate a template through the Slides API
//! DECKFILL_ACCESS_TOKEN=... deckfill populate --template 1AbC --title "Q3 Review" --data q3.json
//!
//! # Work offline on an exported presentation
//! deckfill populate --offline template.json --data q3.json --output populated.json
//!
//! # See what a template expects
//! deckfill inspect --offline template.json --format json
//! ```

pub mod app;
pub mod logging;
pub mod settings;

pub use app::{
    inspect_command, load_data, load_snapshot, plan_command, populate_command, render_outcome,
};
pub use app::{run_cli, OutputFormat, PopulateRequest};
pub use settings::{GatewaySettings, LoggingSettings, RetrySettings, Settings};
