//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::aggregator::OutOfRangePolicy;
use crate::analysis::table::SortColumn;
use crate::dataset::is_remote;
use crate::models::{GroupingLevel, TimeWindow, Variant};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// kpidash - Call center KPI dashboards from CSV exports
///
/// Reads a KPI export, aggregates it into chart-ready panels and writes a
/// Markdown, JSON or self-contained HTML dashboard.
///
/// Examples:
///   kpidash --input fixtures/yearly_kpi.csv
///   kpidash --input calls.csv --time-window last-1-month --level team --level-value T1
///   kpidash --input https://example.com/calls.csv --format html --output dashboard.html
///   kpidash --input calls.csv --as-of 2024-06-30 --sort-by call-sentiment --descending
///   kpidash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file path or http(s) URL
    ///
    /// Can also be set via KPIDASH_INPUT or source.default_input in .kpidash.toml.
    #[arg(short, long, value_name = "PATH|URL", env = "KPIDASH_INPUT")]
    pub input: Option<String>,

    /// Dashboard variant; auto detects it from the header row
    #[arg(long, value_name = "VARIANT")]
    pub variant: Option<VariantChoice>,

    /// Time window applied to CallDate (agent dashboard)
    #[arg(short, long, value_name = "WINDOW")]
    pub time_window: Option<TimeWindow>,

    /// Grouping level (agent dashboard)
    #[arg(short, long, value_name = "LEVEL")]
    pub level: Option<GroupingLevel>,

    /// TeamID or AgentID to keep when --level is team or agent
    #[arg(long, value_name = "ID")]
    pub level_value: Option<String>,

    /// Reference date for time windows (YYYY-MM-DD, midnight UTC)
    ///
    /// Defaults to the current time. Fix it for reproducible reports.
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Sort the detail table by this column
    #[arg(long, value_name = "COLUMN")]
    pub sort_by: Option<SortColumn>,

    /// Sort the detail table in descending order
    #[arg(long)]
    pub descending: bool,

    /// How to treat Customer_Satisfaction values outside 1-5
    #[arg(long, value_name = "POLICY")]
    pub histogram_policy: Option<OutOfRangePolicy>,

    /// Maximum detail-table rows in Markdown and HTML output
    #[arg(long, value_name = "COUNT")]
    pub max_table_rows: Option<usize>,

    /// Output format (markdown, json, html)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report
    ///
    /// Defaults to kpi_dashboard.md, .json or .html depending on --format.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .kpidash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .kpidash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// Self-contained HTML dashboard
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }

    /// Default report path for this format.
    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(format!("kpi_dashboard.{}", self.extension()))
    }
}

/// Variant selection: forced or detected from headers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum VariantChoice {
    #[default]
    Auto,
    Yearly,
    Agent,
}

impl VariantChoice {
    /// The forced variant, `None` for auto-detection.
    pub fn forced(&self) -> Option<Variant> {
        match self {
            VariantChoice::Auto => None,
            VariantChoice::Yearly => Some(Variant::Yearly),
            VariantChoice::Agent => Some(Variant::Agent),
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if input.trim().is_empty() {
                return Err("Input must not be empty".to_string());
            }
            if !is_remote(input) {
                let path = Path::new(input);
                if !path.exists() {
                    return Err(format!("Input file does not exist: {}", path.display()));
                }
                if path.is_dir() {
                    return Err(format!("Input path is a directory: {}", path.display()));
                }
            }
        }

        if self.level_value.is_some() && self.level == Some(GroupingLevel::Enterprise) {
            return Err("--level-value has no effect with --level enterprise".to_string());
        }

        if self.max_table_rows == Some(0) {
            return Err("Max table rows must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Reference instant for time windows: `--as-of` at midnight UTC.
    pub fn as_of_instant(&self) -> Option<DateTime<Utc>> {
        self.as_of
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: None,
            variant: None,
            time_window: None,
            level: None,
            level_value: None,
            as_of: None,
            sort_by: None,
            descending: false,
            histogram_policy: None,
            max_table_rows: None,
            format: None,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "kpidash",
            "--input",
            "https://example.com/calls.csv",
            "--time-window",
            "last-1-month",
            "--level",
            "team",
            "--level-value",
            "T1",
            "--as-of",
            "2024-06-30",
            "--sort-by",
            "call-sentiment",
            "--descending",
            "--format",
            "html",
        ])
        .unwrap();

        assert_eq!(args.time_window, Some(TimeWindow::Last1Month));
        assert_eq!(args.level, Some(GroupingLevel::Team));
        assert_eq!(args.level_value.as_deref(), Some("T1"));
        assert_eq!(args.sort_by, Some(SortColumn::CallSentiment));
        assert!(args.descending);
        assert_eq!(args.format, Some(OutputFormat::Html));
        assert_eq!(
            args.as_of_instant().map(|d| d.to_rfc3339()),
            Some("2024-06-30T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_parse_all_time_window() {
        let args = Args::try_parse_from(["kpidash", "--time-window", "all-time"]).unwrap();
        assert_eq!(args.time_window, Some(TimeWindow::AllTime));
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        assert!(Args::try_parse_from(["kpidash", "--as-of", "30/06/2024"]).is_err());
    }

    #[test]
    fn test_validation_missing_file() {
        let mut args = make_args();
        args.input = Some("/definitely/not/here.csv".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_remote_input_not_checked() {
        let mut args = make_args();
        args.input = Some("https://example.com/calls.csv".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_enterprise_with_value() {
        let mut args = make_args();
        args.level = Some(GroupingLevel::Enterprise);
        args.level_value = Some("T1".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_output_format_defaults() {
        assert_eq!(OutputFormat::Markdown.default_output(), PathBuf::from("kpi_dashboard.md"));
        assert_eq!(OutputFormat::Html.extension(), "html");
        assert_eq!(VariantChoice::Auto.forced(), None);
        assert_eq!(VariantChoice::Agent.forced(), Some(Variant::Agent));
    }
}
