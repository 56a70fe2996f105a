//! CLI entry point for the preprocessing configuration model.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use lex_prepconfig::{
    ColumnDescriptor, ColumnType, ConfigEditor, ConfigEvent, ConfigMode, EditorSettings,
    OptionsCatalog, PreprocessingConfig, application_order, rules_for,
    suggested_output_filename,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[cfg(feature = "api")]
use lex_prepconfig::{ApiClient, ApiConfig};

/// CLI-compatible configuration mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// One options set per data type
    Simple,
    /// One options set per column
    Advanced,
}

impl From<CliMode> for ConfigMode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::Simple => ConfigMode::Simple,
            CliMode::Advanced => ConfigMode::Advanced,
        }
    }
}

/// CLI-compatible column type
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliColumnType {
    Numeric,
    Categorical,
    Text,
    Datetime,
    Boolean,
    Identifier,
    Mixed,
}

impl From<CliColumnType> for ColumnType {
    fn from(cli: CliColumnType) -> Self {
        match cli {
            CliColumnType::Numeric => ColumnType::Numeric,
            CliColumnType::Categorical => ColumnType::Categorical,
            CliColumnType::Text => ColumnType::Text,
            CliColumnType::Datetime => ColumnType::Datetime,
            CliColumnType::Boolean => ColumnType::Boolean,
            CliColumnType::Identifier => ColumnType::Identifier,
            CliColumnType::Mixed => ColumnType::Mixed,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Preprocessing configuration: rules, validation and ML-ready checks",
    long_about = "Inspect the feature compatibility rules, seed and check preprocessing \
                  configurations, and submit them to the backend.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  LEX_API_URL      Backend base URL (submit)\n  \
                  LEX_API_TOKEN    Bearer token for the backend (submit)\n\n\
                  EXAMPLES:\n  \
                  # Show the rules for text columns\n  \
                  lex-prepconfig rules --type text\n\n  \
                  # Seed an advanced, ML-ready configuration\n  \
                  lex-prepconfig init -c columns.json --mode advanced --ml-ready > config.json\n\n  \
                  # Check it before submitting\n  \
                  lex-prepconfig check -c columns.json --config config.json --ml-ready"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable text
    ///
    /// Disables all logs so stdout can be piped: `... --json | jq .`
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the feature compatibility rules
    Rules {
        /// Only this column type
        #[arg(short = 't', long = "type", value_enum)]
        column_type: Option<CliColumnType>,
    },

    /// Print the selectable options and field states
    Options {
        /// Only this column type
        #[arg(short = 't', long = "type", value_enum)]
        column_type: Option<CliColumnType>,

        /// Narrow options as in ML-ready mode
        #[arg(long)]
        ml_ready: bool,

        /// Backend options catalog merged over the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Print a configuration seeded with defaults
    Init {
        #[command(flatten)]
        input: ColumnsInput,

        /// Configuration mode
        #[arg(short, long, value_enum, default_value = "simple")]
        mode: CliMode,

        /// Constrain every output column to be numeric
        #[arg(long)]
        ml_ready: bool,

        /// Output filename (".csv" is appended when missing)
        #[arg(long)]
        output_filename: Option<String>,

        /// Source file name used to suggest an output filename
        #[arg(long, conflicts_with = "output_filename")]
        source: Option<String>,
    },

    /// Validate a configuration against the rules (and ML-ready checks)
    Check {
        #[command(flatten)]
        input: ColumnsInput,

        /// Configuration JSON to check
        #[arg(long)]
        config: PathBuf,

        /// Also require every column to be ML-ready
        #[arg(long)]
        ml_ready: bool,
    },

    /// Check a configuration and submit it to the backend
    #[cfg(feature = "api")]
    Submit {
        /// Backend file id
        #[arg(long)]
        file_id: String,

        /// Configuration JSON to submit
        #[arg(long)]
        config: PathBuf,

        /// Column descriptors (fetched from the backend when omitted)
        #[arg(short, long)]
        columns: Option<PathBuf>,

        /// Also require every column to be ML-ready
        #[arg(long)]
        ml_ready: bool,

        /// Download the produced file to this path
        #[arg(long)]
        download: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ColumnsInput {
    /// Column descriptors JSON (a list or {"columns": [...]})
    #[arg(short, long)]
    columns: PathBuf,

    /// Backend options catalog merged over the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.quiet, cli.json);

    // Load environment variables from .env file
    dotenv().ok();

    match &cli.command {
        Command::Rules { column_type } => run_rules(&cli, column_type.map(Into::into)),
        Command::Options {
            column_type,
            ml_ready,
            catalog,
        } => run_options(
            &cli,
            column_type.map(Into::into),
            *ml_ready,
            catalog.as_deref(),
        ),
        Command::Init {
            input,
            mode,
            ml_ready,
            output_filename,
            source,
        } => {
            let filename = output_filename
                .clone()
                .or_else(|| source.as_deref().map(suggested_output_filename));
            run_init(input, (*mode).into(), *ml_ready, filename)
        }
        Command::Check {
            input,
            config,
            ml_ready,
        } => {
            let columns = load_columns(&input.columns)?;
            let catalog = load_catalog(input.catalog.as_deref())?;
            let editor = load_editor(columns, catalog, config, *ml_ready)?;
            report_check(&cli, &editor)
        }
        #[cfg(feature = "api")]
        Command::Submit {
            file_id,
            config,
            columns,
            ml_ready,
            download,
        } => run_submit(
            &cli,
            file_id,
            config,
            columns.as_deref(),
            *ml_ready,
            download.as_deref(),
        ),
    }
}

fn selected_types(column_type: Option<ColumnType>) -> Vec<ColumnType> {
    column_type.map_or_else(|| ColumnType::ALL.to_vec(), |t| vec![t])
}

/// Print the rule table.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_rules(cli: &Cli, column_type: Option<ColumnType>) -> Result<()> {
    let types = selected_types(column_type);

    if cli.json {
        let table: serde_json::Map<String, serde_json::Value> = types
            .iter()
            .map(|t| -> Result<(String, serde_json::Value)> {
                Ok((t.key().to_string(), serde_json::to_value(rules_for(*t))?))
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    for column_type in types {
        println!("\n{} ({})", column_type.key().to_uppercase(), column_type.label());
        println!("{}", "-".repeat(80));
        println!(
            "{:<20} {:<26} {:<22} {}",
            "Feature", "Conflicts", "Requires", "Applied after"
        );
        for rule in rules_for(column_type) {
            let conflicts: Vec<&str> = rule.real_conflicts().collect();
            let single = if rule.is_single_select() { " [single]" } else { "" };
            println!(
                "{:<20} {:<26} {:<22} {}",
                format!("{}{single}", rule.feature),
                conflicts.join(", "),
                rule.requires.join(" or "),
                rule.applied_after.join(", ")
            );
        }
    }
    Ok(())
}

fn run_options(
    cli: &Cli,
    column_type: Option<ColumnType>,
    ml_ready: bool,
    catalog_path: Option<&Path>,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let types = selected_types(column_type);

    if cli.json {
        let mut out = serde_json::Map::new();
        for t in &types {
            let fields: serde_json::Map<String, serde_json::Value> = catalog
                .features(*t)
                .map(|feature| -> Result<(String, serde_json::Value)> {
                    Ok((
                        feature.to_string(),
                        serde_json::to_value(catalog.field_state(*t, feature, ml_ready))?,
                    ))
                })
                .collect::<Result<_>>()?;
            out.insert(t.key().to_string(), fields.into());
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for t in types {
        println!("\n{}", t.key().to_uppercase());
        println!("{}", "-".repeat(60));
        for feature in catalog.features(t) {
            let state = catalog.field_state(t, feature, ml_ready);
            let default = catalog
                .entry(t, feature)
                .and_then(|e| e.default.as_ref())
                .map(|d| serde_json::to_string(d).unwrap_or_default())
                .unwrap_or_else(|| "-".to_string());
            let lock = if state.editable { "" } else { " (locked)" };
            println!(
                "  {:<20} default {:<16} [{}]{lock}",
                feature,
                default,
                state.options.join(", ")
            );
        }
    }
    Ok(())
}

fn run_init(
    input: &ColumnsInput,
    mode: ConfigMode,
    ml_ready: bool,
    output_filename: Option<String>,
) -> Result<()> {
    let columns = load_columns(&input.columns)?;
    let catalog = load_catalog(input.catalog.as_deref())?;

    let settings = EditorSettings::builder().mode(mode).ml_ready(ml_ready).build()?;
    let mut editor = ConfigEditor::new(columns, catalog, &settings)?;
    if let Some(name) = output_filename {
        editor.apply(ConfigEvent::OutputFilenameChanged(Some(name)))?;
    }

    info!(
        mode = %editor.mode(),
        slices = editor.config().preprocessing.slices().len(),
        "Seeded configuration"
    );
    // The configuration is the output in both text and JSON mode.
    println!("{}", serde_json::to_string_pretty(editor.config())?);
    Ok(())
}

fn report_check(cli: &Cli, editor: &ConfigEditor) -> Result<()> {
    let errors = editor.submission_errors();

    if cli.json {
        let report = serde_json::json!({
            "valid": errors.is_empty(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if errors.is_empty() {
        println!("Configuration is valid. Steps will run in this order:");
        for slice in editor.config().preprocessing.slices() {
            let order = application_order(slice.options.column_type(), &slice.options);
            if !order.is_empty() {
                println!("  {}: {}", slice.target, order.join(" -> "));
            }
        }
    } else {
        println!("Configuration has {} blocking problem(s):", errors.len());
        for error in &errors {
            println!("  - {error}");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Configuration check failed"))
    }
}

#[cfg(feature = "api")]
fn run_submit(
    cli: &Cli,
    file_id: &str,
    config_path: &Path,
    columns_path: Option<&Path>,
    ml_ready: bool,
    download: Option<&Path>,
) -> Result<()> {
    let client = ApiClient::new(ApiConfig::from_env())?;
    info!(base_url = %client.config().base_url, "Using backend");

    let columns = match columns_path {
        Some(path) => load_columns(path)?,
        None => client.fetch_columns(file_id)?,
    };
    let catalog = match client.fetch_options() {
        Ok(backend) => OptionsCatalog::builtin().merge(backend),
        Err(e) => {
            warn!("Could not fetch backend options, using built-in catalog: {}", e);
            OptionsCatalog::builtin()
        }
    };

    let editor = load_editor(columns, catalog, config_path, ml_ready)?;
    let config = match editor.submit() {
        Ok(config) => config,
        Err(e) => {
            for message in e.blocking_messages() {
                eprintln!("  - {message}");
            }
            return Err(e.into());
        }
    };

    let response = client.submit(file_id, &config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("Preprocessing job submitted.");
        if let Some(job_id) = &response.job_id {
            println!("  Job:    {job_id}");
        }
        if let Some(name) = &response.output_filename {
            println!("  Output: {name}");
        }
    }

    if let Some(path) = download {
        let filename = response
            .output_filename
            .clone()
            .or(config.output_filename)
            .ok_or_else(|| anyhow!("Backend did not name an output file to download"))?;
        let bytes = client.download(file_id, &filename)?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "Result downloaded");
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnsFile {
    Bare(Vec<ColumnDescriptor>),
    Wrapped { columns: Vec<ColumnDescriptor> },
}

fn load_columns(path: &Path) -> Result<Vec<ColumnDescriptor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read columns file {}", path.display()))?;
    let columns = match serde_json::from_str::<ColumnsFile>(&content)
        .with_context(|| format!("Invalid columns file {}", path.display()))?
    {
        ColumnsFile::Bare(columns) | ColumnsFile::Wrapped { columns } => columns,
    };
    debug!(columns = columns.len(), "Loaded column descriptors");
    Ok(columns)
}

fn load_catalog(path: Option<&Path>) -> Result<OptionsCatalog> {
    let builtin = OptionsCatalog::builtin();
    let Some(path) = path else {
        return Ok(builtin);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    let backend: OptionsCatalog = serde_json::from_str(&content)
        .with_context(|| format!("Invalid catalog file {}", path.display()))?;
    Ok(builtin.merge(backend))
}

fn load_editor(
    columns: Vec<ColumnDescriptor>,
    catalog: OptionsCatalog,
    config_path: &Path,
    ml_ready: bool,
) -> Result<ConfigEditor> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
    let config: PreprocessingConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", config_path.display()))?;
    Ok(ConfigEditor::with_config(columns, catalog, config, ml_ready)?)
}
