//! Data models for the KPI dashboards.
//!
//! This module contains the core data structures shared by the loader,
//! the aggregation pipeline and the report renderers: rows and datasets,
//! filter state, derived series and the per-panel result type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One CSV record: field name to raw string value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    /// Line number in the source document (1-indexed, header is line 1).
    pub line: usize,
    /// Raw field values keyed by column name.
    pub fields: HashMap<String, String>,
}

impl Row {
    /// Creates a row from `(field, value)` pairs.
    pub fn from_pairs<K, V>(line: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            line,
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// The full in-memory dataset for a session.
///
/// Immutable once loaded; a new load replaces it wholesale.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    /// Where the data came from (path or URL).
    pub source: String,
    /// Header names in file order.
    pub headers: Vec<String>,
    /// Records in file order.
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Detects which dashboard this dataset feeds from its header row.
    pub fn detect_variant(&self) -> Option<Variant> {
        if Variant::Agent
            .required_columns()
            .iter()
            .all(|c| self.has_column(c))
        {
            Some(Variant::Agent)
        } else if Variant::Yearly
            .required_columns()
            .iter()
            .all(|c| self.has_column(c))
        {
            Some(Variant::Yearly)
        } else {
            None
        }
    }
}

/// Dashboard variant, decided by the columns of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Per-year call volumes, satisfaction and KPI scores.
    Yearly,
    /// Per-call agent KPIs with date, team and agent filters.
    Agent,
}

impl Variant {
    /// Columns that must be present for this variant.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Variant::Yearly => &["Year", "Calls_Handled", "Average_Handling_Time"],
            Variant::Agent => &["AgentID", "CallDate"],
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Yearly => write!(f, "Yearly"),
            Variant::Agent => write!(f, "Agent"),
        }
    }
}

/// Time window selector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TimeWindow {
    #[default]
    #[value(name = "last-7-days")]
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[value(name = "last-1-month")]
    #[serde(rename = "last-1-month")]
    Last1Month,
    #[value(name = "last-1-year")]
    #[serde(rename = "last-1-year")]
    Last1Year,
    #[value(name = "last-5-years")]
    #[serde(rename = "last-5-years")]
    Last5Years,
    #[value(name = "all-time")]
    AllTime,
}

impl TimeWindow {
    /// Width of the window in days, `None` for all-time.
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeWindow::Last7Days => Some(7),
            TimeWindow::Last1Month => Some(30),
            TimeWindow::Last1Year => Some(365),
            TimeWindow::Last5Years => Some(5 * 365),
            TimeWindow::AllTime => None,
        }
    }

    /// Earliest instant kept by this window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Last7Days => write!(f, "Last 7 days"),
            TimeWindow::Last1Month => write!(f, "Last 1 Month"),
            TimeWindow::Last1Year => write!(f, "Last 1 Year"),
            TimeWindow::Last5Years => write!(f, "Last 5 Years"),
            TimeWindow::AllTime => write!(f, "All time"),
        }
    }
}

/// Aggregation granularity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum GroupingLevel {
    #[default]
    Enterprise,
    Team,
    Agent,
}

impl GroupingLevel {
    /// Identifier column matched against the grouping value.
    pub fn id_column(&self) -> Option<&'static str> {
        match self {
            GroupingLevel::Enterprise => None,
            GroupingLevel::Team => Some(crate::analysis::agent::TEAM_ID),
            GroupingLevel::Agent => Some(crate::analysis::agent::AGENT_ID),
        }
    }
}

impl fmt::Display for GroupingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingLevel::Enterprise => write!(f, "Enterprise"),
            GroupingLevel::Team => write!(f, "Team"),
            GroupingLevel::Agent => write!(f, "Agent"),
        }
    }
}

/// Filter inputs for the agent dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default)]
    pub level: GroupingLevel,
    #[serde(default)]
    pub level_value: String,
}

impl FilterState {
    /// Human-readable description, e.g. `Last 7 days / Team T1`.
    pub fn describe(&self) -> String {
        match self.level {
            GroupingLevel::Enterprise => format!("{} / Enterprise", self.time_window),
            level => format!("{} / {} {}", self.time_window, level, self.level_value),
        }
    }
}

/// A named array of values aligned with a label axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValues {
    pub name: String,
    pub values: Vec<f64>,
}

/// Label axis plus one or more value arrays of the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub datasets: Vec<NamedValues>,
}

impl Series {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            datasets: Vec::new(),
        }
    }

    /// Adds a value array; it must match the label axis length.
    pub fn with_values(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.labels.len());
        self.datasets.push(NamedValues {
            name: name.into(),
            values,
        });
        self
    }

    /// Looks up a dataset by name.
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.values.as_slice())
    }
}

/// Result of one dashboard panel.
///
/// `NoData` means the filtered set was empty; renderers show a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    NoData,
    Ready(T),
}

impl<T> Panel<T> {
    /// Runs `build` only when there is at least one row.
    pub fn build<R>(rows: &[R], build: impl FnOnce(&[R]) -> T) -> Self {
        if rows.is_empty() {
            Panel::NoData
        } else {
            Panel::Ready(build(rows))
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            Panel::NoData => None,
        }
    }
}

/// Kind of value expected in a field, for parse-issue reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Number,
    Flag,
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Flag => write!(f, "true/false"),
            FieldKind::Date => write!(f, "date"),
        }
    }
}

/// A field that could not be parsed. Non-fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseIssue {
    pub line: usize,
    pub field: String,
    pub expected: FieldKind,
    /// Raw value, `None` when the field was absent.
    pub raw: Option<String>,
}

/// A record the CSV reader could not read at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadWarning {
    pub line: usize,
    pub message: String,
}

/// Metadata about a generated dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Report title.
    pub title: String,
    /// Path or URL of the input CSV.
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Reference instant used for time windows.
    pub as_of: DateTime<Utc>,
    /// Dashboard variant.
    pub variant: Variant,
    /// Rows in the dataset before filtering.
    pub total_rows: usize,
    /// Records skipped by the reader.
    pub read_warnings: Vec<ReadWarning>,
    /// Wall-clock time spent loading and aggregating.
    pub duration_seconds: f64,
}
