//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;

use deckfill_core::{inspect, preview, Engine, Gateway, MemoryGateway, Outcome, Severity};
use deckfill_gateway::presentation_url;
use deckfill_model::DocumentSnapshot;

use crate::logging;
use crate::settings::Settings;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "deckfill")]
#[command(author, version, about = "Populate slide templates with structured data", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./deckfill.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a template and populate it with data
    Populate {
        /// Template presentation id (not needed with --offline)
        #[arg(short, long)]
        template: Option<String>,

        /// Title of the new presentation
        #[arg(long, default_value = "Generated Presentation")]
        title: String,

        /// JSON data file
        #[arg(short, long)]
        data: PathBuf,

        /// Drive folder id or URL to file the new presentation into
        #[arg(long)]
        folder: Option<String>,

        /// Work on an exported presentation JSON instead of the remote API
        #[arg(long)]
        offline: Option<PathBuf>,

        /// Where to write the populated presentation (offline only)
        #[arg(short, long, requires = "offline")]
        output: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the bound tables and placeholders of a template
    Inspect {
        /// Template presentation id
        #[arg(short, long, required_unless_present = "offline")]
        template: Option<String>,

        /// Exported presentation JSON
        #[arg(long, conflicts_with = "template")]
        offline: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show what populating a template would do, without changing it
    Plan {
        /// Exported presentation JSON
        #[arg(long)]
        offline: PathBuf,

        /// JSON data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments of the populate command
#[derive(Debug, Clone, Default)]
pub struct PopulateRequest {
    /// Template presentation id; the offline file's id when unset
    pub template: Option<String>,
    pub title: String,
    pub data: PathBuf,
    pub folder: Option<String>,
    pub offline: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    logging::init(&settings.logging.level, cli.verbose, cli.quiet);

    match cli.command {
        Commands::Populate {
            template,
            title,
            data,
            folder,
            offline,
            output,
            format,
        } => {
            let request = PopulateRequest {
                template,
                title,
                data,
                folder,
                offline,
                output,
                format,
            };
            populate_command(&settings, &request)?;
        }
        Commands::Inspect {
            template,
            offline,
            format,
        } => {
            inspect_command(&settings, template.as_deref(), offline.as_deref(), format)?;
        }
        Commands::Plan {
            offline,
            data,
            format,
        } => {
            plan_command(&settings, &offline, &data, format)?;
        }
    }

    Ok(())
}

/// Read a JSON data file; the top level must be an object
pub fn load_data(path: &Path) -> Result<Value> {
    if !path.exists() {
        anyhow::bail!("Data file not found: {}", path.display());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("Data file is not valid JSON: {}", path.display()))?;
    if !data.is_object() {
        anyhow::bail!("Data file must contain a JSON object: {}", path.display());
    }
    Ok(data)
}

/// Read a presentation file
///
/// Accepts the Slides API resource (as returned by `presentations.get`) or
/// a snapshot previously written by `populate --output`.
pub fn load_snapshot(path: &Path) -> Result<DocumentSnapshot> {
    let content = fs::read(path)
        .with_context(|| format!("Failed to read presentation file: {}", path.display()))?;
    let value: Value = serde_json::from_slice(&content)
        .with_context(|| format!("Presentation file is not valid JSON: {}", path.display()))?;

    let snapshot = if value.get("presentationId").is_some() {
        deckfill_gateway::decode(&content)?
    } else {
        serde_json::from_value(value).with_context(|| {
            format!("Unrecognized presentation format: {}", path.display())
        })?
    };
    Ok(snapshot)
}

/// Populate a template, online or against an exported presentation
pub fn populate_command(settings: &Settings, request: &PopulateRequest) -> Result<()> {
    let data = load_data(&request.data)?;

    match &request.offline {
        Some(path) => {
            let snapshot = load_snapshot(path)?;
            let template = request
                .template
                .clone()
                .unwrap_or_else(|| snapshot.document_id.clone());
            let gateway = MemoryGateway::with_document(snapshot);

            let outcome = run_populate(settings, &gateway, &template, request, &data)?;

            if let Some(output) = &request.output {
                let document = gateway
                    .document(&outcome.document_id)
                    .context("Populated presentation is missing from the offline store")?;
                let json = serde_json::to_string_pretty(&document)
                    .context("Failed to serialize populated presentation")?;
                fs::write(output, json)
                    .with_context(|| format!("Failed to write output file: {}", output.display()))?;
            }
            print_outcome(&outcome, None, request.format)
        }
        None => {
            let template = request
                .template
                .as_deref()
                .context("--template is required unless --offline is given")?;
            let client = settings.gateway.client()?;

            let outcome = run_populate(settings, &client, template, request, &data)?;
            let url = presentation_url(&outcome.document_id);
            print_outcome(&outcome, Some(&url), request.format)
        }
    }
}

fn run_populate<G: Gateway + ?Sized>(
    settings: &Settings,
    gateway: &G,
    template: &str,
    request: &PopulateRequest,
    data: &Value,
) -> Result<Outcome> {
    let outcome = Engine::new(gateway)
        .with_config(settings.engine.clone())
        .populate(template, &request.title, data, request.folder.as_deref())
        .with_context(|| format!("Failed to populate template {}", template))?;
    Ok(outcome)
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    #[serde(flatten)]
    outcome: &'a Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

fn print_outcome(outcome: &Outcome, url: Option<&str>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&OutcomeReport { outcome, url })
                .context("Failed to serialize outcome to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", render_outcome(outcome, url)),
    }
    Ok(())
}

/// Human-readable run report
pub fn render_outcome(outcome: &Outcome, url: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("✓ Populated presentation {}\n", outcome.document_id));
    if let Some(url) = url {
        out.push_str(&format!("  {}\n", url));
    }
    out.push('\n');
    out.push_str(&outcome.statistics.to_string());
    out.push('\n');

    if !outcome.diagnostics.is_empty() {
        out.push('\n');
        for diag in &outcome.diagnostics {
            out.push_str(&format!("{}\n", diag));
        }
        let warnings = outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        out.push_str(&format!(
            "Found {} warning(s) and {} note(s)\n",
            warnings,
            outcome.diagnostics.len() - warnings
        ));
    }
    out
}

/// Describe the bound tables and placeholders of a template
pub fn inspect_command(
    settings: &Settings,
    template: Option<&str>,
    offline: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let snapshot = match (offline, template) {
        (Some(path), _) => load_snapshot(path)?,
        (None, Some(id)) => settings
            .gateway
            .client()?
            .fetch(id)
            .with_context(|| format!("Failed to fetch presentation {}", id))?,
        (None, None) => anyhow::bail!("Either --template or --offline is required"),
    };

    let report = inspect(&snapshot, settings.engine.marker_scope);
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize report to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!(
                "{} ({})",
                report.title.as_deref().unwrap_or("Untitled"),
                report.document_id
            );
            println!("Slides: {}", report.slide_count);
            println!();
            if report.tables.is_empty() {
                println!("No bound tables");
            } else {
                println!("Bound tables:");
                for table in &report.tables {
                    println!(
                        "  - {} on slide {} ({}): {}",
                        table.array_key,
                        table.slide_index + 1,
                        table.table_id,
                        table.columns.join(", ")
                    );
                }
            }
            println!();
            if report.scalar_keys.is_empty() {
                println!("No placeholders");
            } else {
                println!("Placeholders: {}", report.scalar_keys.join(", "));
            }
        }
    }
    Ok(())
}

/// Dry run: population against an in-memory copy of an exported template
pub fn plan_command(
    settings: &Settings,
    offline: &Path,
    data: &Path,
    format: OutputFormat,
) -> Result<()> {
    let snapshot = load_snapshot(offline)?;
    let data = load_data(data)?;
    let preview = preview(&settings.engine, &snapshot, &data)
        .with_context(|| format!("Failed to plan {}", offline.display()))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "plans": preview.plans,
                "statistics": preview.outcome.statistics,
                "diagnostics": preview.outcome.diagnostics,
            }))
            .context("Failed to serialize plan to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("Plans:");
            for plan in &preview.plans {
                let action = if plan.deletes_slide {
                    "delete slide".to_string()
                } else {
                    format!("{} slide(s)", plan.slides_needed)
                };
                println!(
                    "  - {}: {} item(s) -> {} ({})",
                    plan.array_key, plan.item_count, action, plan.slide_id
                );
            }
            println!();
            print!("{}", render_outcome(&preview.outcome, None));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use deckfill_core::{BatchStatistics, Diagnostic};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_populate() {
        let cli = Cli::try_parse_from([
            "deckfill", "-v", "populate", "--template", "T1", "--data", "d.json", "--folder",
            "F1", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Populate {
                template,
                title,
                folder,
                format,
                ..
            } => {
                assert_eq!(template.as_deref(), Some("T1"));
                assert_eq!(title, "Generated Presentation");
                assert_eq!(folder.as_deref(), Some("F1"));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected populate"),
        }
    }

    #[test]
    fn test_output_requires_offline() {
        assert!(Cli::try_parse_from([
            "deckfill", "populate", "--template", "T1", "--data", "d.json", "--output", "o.json"
        ])
        .is_err());
    }

    #[test]
    fn test_inspect_needs_a_source() {
        assert!(Cli::try_parse_from(["deckfill", "inspect"]).is_err());
        assert!(Cli::try_parse_from(["deckfill", "inspect", "--offline", "p.json"]).is_ok());
    }

    #[test]
    fn test_render_outcome() {
        let outcome = Outcome {
            document_id: "doc1".to_string(),
            statistics: BatchStatistics::default(),
            diagnostics: vec![
                Diagnostic::warning("Array key 'x' not found in data").with_code("DF001"),
                Diagnostic::info("No data for placeholder '{{y}}'").with_code("DF005"),
            ],
        };
        let text = render_outcome(&outcome, Some("https://example.com/doc1"));
        assert!(text.contains("doc1"));
        assert!(text.contains("https://example.com/doc1"));
        assert!(text.contains("BATCH UPDATE SUMMARY"));
        assert!(text.contains("Found 1 warning(s) and 1 note(s)"));
    }
}
