//! kpidash - Call center KPI dashboards from CSV exports
//!
//! A CLI tool that loads a KPI export, aggregates it into chart-ready
//! panels and writes a Markdown, JSON or HTML dashboard.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (no input, unreadable file, bad config, missing columns, etc.)

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dataset::{load_source, validate_columns, LoadOptions};
use error::DashError;
use models::{FilterState, ReportMetadata};
use report::Report;
use session::Session;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("kpidash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_dashboard(args).await {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .kpidash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the default input, filters, thresholds and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, aggregate and render one dashboard.
async fn run_dashboard(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let now = args.as_of_instant().unwrap_or_else(Utc::now);
    let mut session = Session::new(FilterState::default(), config.dashboard_options());

    // Step 1: Load the dataset
    let source = config
        .source
        .default_input
        .clone()
        .ok_or(DashError::NoDataset)?;

    if !args.quiet {
        println!("📥 Loading dataset: {}", source);
    }
    let mut load_options = LoadOptions::from(&config.source);
    load_options.show_progress = !args.quiet;

    let loaded = load_source(&source, &load_options)
        .await
        .with_context(|| format!("Failed to load {}", source))?;

    for warning in &loaded.warnings {
        warn!("Line {}: {}", warning.line, warning.message);
    }

    // Step 2: Decide the variant
    let total_rows = loaded.dataset.len();
    session.load(loaded.dataset, config.source.variant.forced());

    let (variant, dataset) = match (session.variant(), session.dataset()) {
        (Some(variant), Some(dataset)) => (variant, dataset),
        (None, Some(dataset)) => {
            return Err(DashError::UnknownVariant(dataset.headers.clone()).into())
        }
        (_, None) => return Err(DashError::NoDataset.into()),
    };
    validate_columns(dataset, variant)?;
    if dataset.is_empty() {
        warn!("{} has a header row but no records", source);
    }
    info!("Using the {} dashboard", variant);

    // Step 3: Aggregate
    if !args.quiet {
        println!("🔬 Building {} dashboard...", variant);
    }
    session.set_filters(config.filters.clone());
    let dashboard = session.dashboard(now)?;

    // Step 4: Render and save
    let metadata = ReportMetadata {
        title: config.report.title.clone(),
        source: source.clone(),
        generated_at: Utc::now(),
        as_of: now,
        variant,
        total_rows,
        read_warnings: loaded.warnings,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = Report::new(metadata, dashboard).with_max_table_rows(config.report.max_table_rows);

    let output = match config.general.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Html => report::generate_html_report(&report)?,
    };

    let output_path = config.output_path();
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        print_summary(&report);
        println!(
            "\n✅ Dashboard complete! Report saved to: {}",
            output_path.display()
        );
    }

    Ok(())
}

/// Print a short console summary of the dashboard.
fn print_summary(report: &Report) {
    use analysis::Dashboard;

    println!("\n📊 Dashboard Summary:");
    println!("   Dashboard: {}", report.dashboard.variant());
    println!("   Rows: {}", report.metadata.total_rows);

    match &report.dashboard {
        Dashboard::Yearly(d) => match d.summary.as_ready() {
            Some(summary) => {
                println!("   Years: {}", summary.years.join(", "));
                println!("   Total calls handled: {}", summary.grand_total_calls);
                println!(
                    "   Average handling time: {}",
                    summary.overall_avg_handling_time_label()
                );
            }
            None => println!("   No data"),
        },
        Dashboard::Agent(d) => {
            println!("   Filters: {}", d.filters.describe());
            println!("   Matching calls: {} of {}", d.filtered_rows, d.total_rows);
            match d.gauges.as_ready() {
                Some(gauges) => {
                    let line: Vec<String> = gauges
                        .iter()
                        .map(|g| format!("{} {}: {}", g.tone.emoji(), g.label, g.display()))
                        .collect();
                    println!("   {}", line.join(" | "));
                }
                None => println!("   No calls match the selected filters"),
            }
        }
    }

    let issues = report.dashboard.parse_issues().len();
    if issues > 0 || !report.metadata.read_warnings.is_empty() {
        println!(
            "   ⚠️  {} unparseable fields, {} skipped records",
            issues,
            report.metadata.read_warnings.len()
        );
    }
    println!("   Duration: {:.2}s", report.metadata.duration_seconds);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
