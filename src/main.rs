//! sensor-faults - sensor CSV fault detection
//!
//! Reads a wide sensor CSV (one timestamp column, one column per sensor),
//! reshapes it into long readings, classifies each reading against
//! threshold bands and reports the fault distribution.
//!
//! # Usage
//!
//! ```bash
//! # Classify a file and print the summary
//! sensor-faults classify --input sensors.csv
//!
//! # Restrict to two days and one sensor, export and persist
//! sensor-faults classify --input sensors.csv --from 2025-01-01 --to 2025-01-02 \
//!     --sensor Sensor_1 --export faults.csv --store
//!
//! # Export previously stored readings
//! sensor-faults export --output all_faults.csv
//! ```
//!
//! # Environment Variables
//!
//! - `SENSOR_FAULTS_CONFIG`: Path to the TOML config (default: ./detector_config.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use sensor_faults::config::defaults;
use sensor_faults::filter::{self, DateRange, ReadingFilter};
use sensor_faults::{
    export, ClassifiedReading, DetectorConfig, FaultDetector, FaultSummary, ReadingStore,
    ReshapeReport,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sensor-faults")]
#[command(about = "Sensor CSV ingest and threshold fault classification")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file. Load errors are fatal when given.
    #[arg(long, global = true, env = "SENSOR_FAULTS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the reading store directory from the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Ingest a wide CSV, classify every reading and print a fault summary
    Classify {
        /// Wide CSV with a timestamp column and one column per sensor
        #[arg(long, short)]
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the selected classified readings to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Persist every classified reading into the store (replaces its contents)
        #[arg(long)]
        store: bool,

        /// Number of classified rows to print
        #[arg(long, default_value_t = defaults::PREVIEW_ROWS)]
        show: usize,
    },

    /// Export stored readings to CSV
    Export {
        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Print reading store statistics
    Stats,

    /// Remove every stored reading
    Clear,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(clap::Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file and print any warnings
    Check {
        /// Defaults to ./detector_config.toml
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the built-in default config as TOML
    Default,
}

/// Date and sensor selection shared by `classify` and `export`
#[derive(clap::Args, Debug)]
struct SelectionArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only the last 7 days of data (ignored when --from/--to are given)
    #[arg(long)]
    recent: bool,

    /// Sensor to include; repeat for several. Default: all sensors.
    #[arg(long = "sensor", value_name = "SENSOR_ID")]
    sensors: Vec<String>,
}

impl SelectionArgs {
    /// Missing bounds default to the span of `table`
    fn to_filter(&self, table: &[ClassifiedReading]) -> Result<ReadingFilter> {
        let date_range = match (self.from, self.to) {
            (None, None) if self.recent => DateRange::default_window(table),
            (None, None) => None,
            (from, to) => match DateRange::spanning(table) {
                Some(span) => Some(DateRange::new(
                    from.unwrap_or(span.start()),
                    to.unwrap_or(span.end()),
                )?),
                None => None,
            },
        };

        if !self.sensors.is_empty() {
            let available = filter::available_sensors(table);
            for s in &self.sensors {
                if !available.contains(s) {
                    warn!(sensor = %s, "Selected sensor not present in data");
                }
            }
        }

        Ok(ReadingFilter {
            date_range,
            sensors: (!self.sensors.is_empty()).then(|| self.sensors.clone()),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(args: &CliArgs) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectorConfig::load(),
    };
    if let Some(db) = &args.db {
        config.storage.path = db.clone();
    }
    Ok(config)
}

fn open_store(path: &Path) -> Result<ReadingStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    ReadingStore::open(path).with_context(|| format!("Failed to open reading store {}", path.display()))
}

fn print_report(report: &ReshapeReport, readings: usize) {
    println!("Sensors ({}): {}", report.sensor_ids.len(), report.sensor_ids.join(", "));
    println!(
        "Rows: {} read, {} kept, {} dropped (unparseable timestamp)",
        report.input_rows,
        report.kept_rows(),
        report.dropped_rows
    );
    println!(
        "Readings: {} ({} missing values, {} non-numeric cells)",
        readings, report.missing_values, report.invalid_cells
    );
    println!();
}

fn print_preview(table: &[ClassifiedReading], limit: usize) {
    if limit == 0 || table.is_empty() {
        return;
    }
    println!("Classified readings (first {} of {})", limit.min(table.len()), table.len());
    println!(
        "{:<21}{:<20}{:>12}  {:<10}{}",
        "Timestamp", "SensorID", "SensorValue", "FaultType", "Severity"
    );
    for r in table.iter().take(limit) {
        let value = r.value().map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<21}{:<20}{:>12}  {:<10}{}",
            r.timestamp().format("%Y-%m-%d %H:%M:%S"),
            r.sensor_id(),
            value,
            r.fault_type.as_str(),
            r.severity
        );
    }
    println!();
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_classify(
    config: &DetectorConfig,
    input: &Path,
    selection: &SelectionArgs,
    export_path: Option<&Path>,
    store: bool,
    show: usize,
) -> Result<()> {
    let detector = FaultDetector::from_config(config).context("Invalid threshold configuration")?;
    let run = detector
        .process_file(input)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    print_report(&run.report, run.readings.len());

    if store {
        let db = open_store(&config.storage.path)?;
        db.init().context("Failed to reset reading store")?;
        let n = db.insert(&run.readings).context("Failed to store readings")?;
        db.close().context("Failed to close reading store")?;
        info!(readings = n, path = %config.storage.path.display(), "Stored classified readings");
    }

    let selected = selection.to_filter(&run.readings)?.apply(&run.readings);
    if selected.is_empty() {
        warn!("Selection matched no readings");
    }

    print_preview(&selected, show);
    print!("{}", FaultSummary::from_readings(&selected));

    if let Some(path) = export_path {
        let rows = export::export_csv(path, &selected)?;
        println!();
        println!("Exported {} rows to {}", rows, path.display());
    }

    Ok(())
}

fn run_export(config: &DetectorConfig, output: &Path, selection: &SelectionArgs) -> Result<()> {
    let db = open_store(&config.storage.path)?;
    let all = db.fetch_all().context("Failed to read stored readings")?;
    db.close().context("Failed to close reading store")?;

    if all.is_empty() {
        bail!("Reading store {} is empty", config.storage.path.display());
    }

    let selected = selection.to_filter(&all)?.apply(&all);
    let rows = export::export_csv(output, &selected)?;
    println!("Exported {} of {} stored readings to {}", rows, all.len(), output.display());
    Ok(())
}

fn run_stats(config: &DetectorConfig) -> Result<()> {
    let db = open_store(&config.storage.path)?;
    let stats = db.stats().context("Failed to read store statistics")?;
    db.close().context("Failed to close reading store")?;

    println!("Store:    {}", config.storage.path.display());
    println!("Readings: {}", stats.reading_count);
    println!("Size:     {:.2} MB", stats.size_mb());
    match (stats.oldest_timestamp, stats.newest_timestamp) {
        (Some(oldest), Some(newest)) => {
            println!("Oldest:   {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            println!("Newest:   {}", newest.format("%Y-%m-%d %H:%M:%S"));
        }
        _ => println!("(empty)"),
    }
    Ok(())
}

fn run_clear(config: &DetectorConfig) -> Result<()> {
    let db = open_store(&config.storage.path)?;
    let removed = db.count();
    db.clear().context("Failed to clear reading store")?;
    db.close().context("Failed to close reading store")?;
    println!("Removed {} readings from {}", removed, config.storage.path.display());
    Ok(())
}

fn run_config_check(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(defaults::LOCAL_CONFIG_FILE));
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let (config, warnings) = DetectorConfig::parse_toml(&raw)
        .with_context(|| format!("Invalid config {}", path.display()))?;

    for w in &warnings {
        println!("warning: {}", w);
    }
    println!(
        "{}: OK ({} warning{}, {} sensor override{})",
        path.display(),
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" },
        config.thresholds.sensors.len(),
        if config.thresholds.sensors.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Config subcommands don't need a loaded config
    if let SubCommand::Config(cmd) = &args.command {
        return match cmd {
            ConfigCommand::Check { path } => run_config_check(path.clone().or_else(|| args.config.clone())),
            ConfigCommand::Default => {
                print!("{}", DetectorConfig::default().to_toml()?);
                Ok(())
            }
        };
    }

    let config = load_config(&args)?;

    match &args.command {
        SubCommand::Classify {
            input,
            selection,
            export,
            store,
            show,
        } => run_classify(&config, input, selection, export.as_deref(), *store, *show),
        SubCommand::Export { output, selection } => run_export(&config, output, selection),
        SubCommand::Stats => run_stats(&config),
        SubCommand::Clear => run_clear(&config),
        SubCommand::Config(_) => Ok(()),
    }
}
