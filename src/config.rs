//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.kpidash.toml` files.

use crate::analysis::agent::Thresholds;
use crate::analysis::aggregator::OutOfRangePolicy;
use crate::analysis::table::SortColumn;
use crate::analysis::DashboardOptions;
use crate::cli::{OutputFormat, VariantChoice};
use crate::models::FilterState;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".kpidash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Default filters for the agent dashboard.
    #[serde(default)]
    pub filters: FilterState,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Report path; derived from the format when unset.
    #[serde(default)]
    pub output: Option<String>,
}

/// Where and how to read the CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path or URL used when --input is not given.
    #[serde(default)]
    pub default_input: Option<String>,

    /// Dashboard variant.
    #[serde(default)]
    pub variant: VariantChoice,

    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// HTTP timeout for remote inputs.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            default_input: None,
            variant: VariantChoice::Auto,
            delimiter: default_delimiter(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_timeout() -> u64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Gauge and cell score at or above which a value is good.
    #[serde(default = "default_gauge_good")]
    pub gauge_good: f64,

    /// Gauge and cell score at or above which a value needs attention.
    #[serde(default = "default_gauge_warn")]
    pub gauge_warn: f64,

    /// Treatment of Customer_Satisfaction values outside 1-5.
    #[serde(default)]
    pub histogram_policy: OutOfRangePolicy,

    /// Detail table sort column.
    #[serde(default)]
    pub sort_by: Option<SortColumn>,

    /// Sort the detail table in descending order.
    #[serde(default)]
    pub descending: bool,

    /// Maximum detail-table rows in Markdown and HTML output.
    #[serde(default)]
    pub max_table_rows: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            gauge_good: default_gauge_good(),
            gauge_warn: default_gauge_warn(),
            histogram_policy: OutOfRangePolicy::default(),
            sort_by: None,
            descending: false,
            max_table_rows: None,
        }
    }
}

fn default_title() -> String {
    "Call Center KPI Dashboard".to_string()
}

fn default_gauge_good() -> f64 {
    0.75
}

fn default_gauge_warn() -> f64 {
    0.5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.source.default_input = Some(input.clone());
        }
        if let Some(variant) = args.variant {
            self.source.variant = variant;
        }

        if let Some(window) = args.time_window {
            self.filters.time_window = window;
        }
        if let Some(level) = args.level {
            self.filters.level = level;
        }
        if let Some(ref value) = args.level_value {
            self.filters.level_value = value.clone();
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(policy) = args.histogram_policy {
            self.report.histogram_policy = policy;
        }
        if let Some(column) = args.sort_by {
            self.report.sort_by = Some(column);
        }
        if args.descending {
            self.report.descending = true;
        }
        if let Some(limit) = args.max_table_rows {
            self.report.max_table_rows = Some(limit);
        }
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let (good, warn) = (self.report.gauge_good, self.report.gauge_warn);
        if !(0.0..=1.0).contains(&good) || !(0.0..=1.0).contains(&warn) {
            bail!("Gauge thresholds must be between 0.0 and 1.0");
        }
        if warn > good {
            bail!(
                "report.gauge_warn ({}) must not exceed report.gauge_good ({})",
                warn,
                good
            );
        }
        if !self.source.delimiter.is_ascii() {
            bail!("source.delimiter must be a single ASCII character");
        }
        if self.report.max_table_rows == Some(0) {
            bail!("report.max_table_rows must be at least 1");
        }
        Ok(())
    }

    /// Options for the aggregation pipeline.
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            thresholds: Thresholds {
                good: self.report.gauge_good,
                warn: self.report.gauge_warn,
            },
            out_of_range: self.report.histogram_policy,
            sort: self.report.sort_by.map(|column| (column, self.report.descending)),
        }
    }

    /// Effective report path.
    pub fn output_path(&self) -> PathBuf {
        match self.general.output {
            Some(ref output) => PathBuf::from(output),
            None => self.general.format.default_output(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::models::{GroupingLevel, TimeWindow};
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.report.title, "Call Center KPI Dashboard");
        assert_eq!(config.source.delimiter, ',');
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.filters.time_window, TimeWindow::Last7Days);
        assert_eq!(config.output_path(), PathBuf::from("kpi_dashboard.md"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "html"

[source]
default_input = "fixtures/agent_calls_kpi.csv"
delimiter = ";"

[filters]
time_window = "last-1-year"
level = "team"
level_value = "T2"

[report]
gauge_good = 0.8
histogram_policy = "clamp"
sort_by = "empathy"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, OutputFormat::Html);
        assert_eq!(config.source.delimiter, ';');
        assert_eq!(config.filters.time_window, TimeWindow::Last1Year);
        assert_eq!(config.filters.level, GroupingLevel::Team);
        assert_eq!(config.report.gauge_warn, 0.5);
        assert_eq!(config.output_path(), PathBuf::from("kpi_dashboard.html"));

        let options = config.dashboard_options();
        assert_eq!(options.thresholds.good, 0.8);
        assert_eq!(options.out_of_range, OutOfRangePolicy::Clamp);
        assert_eq!(options.sort, Some((SortColumn::Empathy, false)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[report]\ntitle = \"Team Review\"\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.report.title, "Team Review");
        assert_eq!(config.report.gauge_good, 0.75);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[filters]\ntime_window = \"fortnight\"\n").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.filters.level = GroupingLevel::Team;
        config.filters.level_value = "T1".to_string();

        let args = Args::try_parse_from([
            "kpidash",
            "--level-value",
            "T2",
            "--format",
            "json",
            "--descending",
            "--sort-by",
            "agent-id",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.filters.level, GroupingLevel::Team);
        assert_eq!(config.filters.level_value, "T2");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.output_path(), PathBuf::from("kpi_dashboard.json"));
        assert_eq!(
            config.dashboard_options().sort,
            Some((SortColumn::AgentId, true))
        );
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = Config::default();
        config.report.gauge_warn = 0.9;
        assert!(config.validate().is_err());

        config.report.gauge_warn = 0.5;
        config.report.gauge_good = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[filters]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.filters, FilterState::default());
    }
}
