//! Aggregation pipeline.
//!
//! Turns a loaded [`Dataset`] and the current [`FilterState`] into one of
//! the two dashboards. Every panel is recomputed from scratch on each call.

pub mod agent;
pub mod aggregator;
pub mod filter;
pub mod stats;
pub mod table;

use crate::dataset::values::{parse_call_date, parse_flag, parse_float_prefix, parse_int_prefix};
use crate::error::DashError;
use crate::models::{Dataset, FieldKind, FilterState, Panel, ParseIssue, Row, Series, Variant};
use agent::{FlagCounts, Gauge, Thresholds};
use aggregator::{OutOfRangePolicy, SatisfactionHistogram, YearlySummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use table::{DetailTable, SortColumn};
use tracing::{debug, info};

/// Knobs that change how panels are computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardOptions {
    pub thresholds: Thresholds,
    pub out_of_range: OutOfRangePolicy,
    /// Detail table ordering: column and descending flag.
    pub sort: Option<(SortColumn, bool)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlyDashboard {
    pub row_count: usize,
    pub summary: Panel<YearlySummary>,
    pub satisfaction: Panel<SatisfactionHistogram>,
    pub kpi_averages: Panel<Series>,
    pub parse_issues: Vec<ParseIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentDashboard {
    pub filters: FilterState,
    /// Earliest call date kept, `None` for all-time.
    pub cutoff: Option<DateTime<Utc>>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub gauges: Panel<Vec<Gauge>>,
    pub trend: Panel<Series>,
    pub overall: Panel<Series>,
    pub flags: Panel<FlagCounts>,
    pub table: Panel<DetailTable>,
    pub parse_issues: Vec<ParseIssue>,
}

/// A computed dashboard of either variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum Dashboard {
    Yearly(YearlyDashboard),
    Agent(AgentDashboard),
}

impl Dashboard {
    pub fn variant(&self) -> Variant {
        match self {
            Dashboard::Yearly(_) => Variant::Yearly,
            Dashboard::Agent(_) => Variant::Agent,
        }
    }

    pub fn parse_issues(&self) -> &[ParseIssue] {
        match self {
            Dashboard::Yearly(d) => &d.parse_issues,
            Dashboard::Agent(d) => &d.parse_issues,
        }
    }
}

const YEARLY_CHECKS: [(&str, FieldKind); 8] = [
    (aggregator::CALLS_HANDLED, FieldKind::Integer),
    (aggregator::AVERAGE_HANDLING_TIME, FieldKind::Number),
    (aggregator::CUSTOMER_SATISFACTION, FieldKind::Integer),
    (aggregator::KPI_FIELDS[0].0, FieldKind::Integer),
    (aggregator::KPI_FIELDS[1].0, FieldKind::Integer),
    (aggregator::KPI_FIELDS[2].0, FieldKind::Integer),
    (aggregator::KPI_FIELDS[3].0, FieldKind::Integer),
    (aggregator::YEAR, FieldKind::Integer),
];

const AGENT_CHECKS: [(&str, FieldKind); 8] = [
    (agent::CALL_DATE, FieldKind::Date),
    (agent::CALL_SENTIMENT, FieldKind::Number),
    (agent::AGENT_ENTHUSIASM, FieldKind::Number),
    (agent::EMPATHY, FieldKind::Number),
    (agent::CALL_CLARITY, FieldKind::Number),
    (agent::RUDE_BEHAVIOUR, FieldKind::Flag),
    (agent::IDENTIFIED_CUSTOMER, FieldKind::Flag),
    (agent::ACCURATE_INFO, FieldKind::Flag),
];

/// Build the dashboard for `variant` from the full dataset.
///
/// The yearly dashboard always covers every row; filters only apply to the
/// agent dashboard.
pub fn build_dashboard(
    dataset: &Dataset,
    variant: Variant,
    filters: &FilterState,
    options: &DashboardOptions,
    now: DateTime<Utc>,
) -> Result<Dashboard, DashError> {
    info!("Building {} dashboard from {} rows", variant, dataset.len());

    match variant {
        Variant::Yearly => {
            if *filters != FilterState::default() {
                info!(
                    "Filters [{}] do not apply to the yearly dashboard",
                    filters.describe()
                );
            }
            build_yearly(dataset, options).map(Dashboard::Yearly)
        }
        Variant::Agent => Ok(Dashboard::Agent(build_agent(dataset, filters, options, now))),
    }
}

fn build_yearly(dataset: &Dataset, options: &DashboardOptions) -> Result<YearlyDashboard, DashError> {
    let rows: Vec<&Row> = dataset.rows.iter().collect();

    let satisfaction = if rows.is_empty() {
        Panel::NoData
    } else {
        Panel::Ready(aggregator::satisfaction_histogram(&rows, options.out_of_range)?)
    };

    Ok(YearlyDashboard {
        row_count: rows.len(),
        summary: Panel::build(&rows, aggregator::yearly_summary),
        satisfaction,
        kpi_averages: Panel::build(&rows, aggregator::kpi_averages),
        parse_issues: collect_parse_issues(dataset, &YEARLY_CHECKS),
    })
}

fn build_agent(
    dataset: &Dataset,
    filters: &FilterState,
    options: &DashboardOptions,
    now: DateTime<Utc>,
) -> AgentDashboard {
    let rows = filter::apply_filters(dataset, filters, now);
    if rows.is_empty() {
        info!("No calls match [{}]", filters.describe());
    }

    let table = Panel::build(&rows, |rows| {
        let mut table = table::detail_table(rows, &options.thresholds);
        if let Some((column, descending)) = options.sort {
            table.sort_by(column, descending);
        }
        table
    });

    AgentDashboard {
        filters: filters.clone(),
        cutoff: filters.time_window.cutoff(now),
        total_rows: dataset.len(),
        filtered_rows: rows.len(),
        gauges: Panel::build(&rows, |rows| agent::gauges(rows, &options.thresholds)),
        trend: Panel::build(&rows, agent::kpi_trend),
        overall: Panel::build(&rows, agent::overall_kpi),
        flags: Panel::build(&rows, agent::flag_counts),
        table,
        parse_issues: collect_parse_issues(dataset, &AGENT_CHECKS),
    }
}

/// List every field that fails to parse as its expected kind.
///
/// Only columns present in the header row are checked, so an export that
/// omits an optional column does not flood the report.
pub fn collect_parse_issues(dataset: &Dataset, checks: &[(&str, FieldKind)]) -> Vec<ParseIssue> {
    let checks: Vec<&(&str, FieldKind)> =
        checks.iter().filter(|(field, _)| dataset.has_column(field)).collect();

    let mut issues = Vec::new();
    for row in &dataset.rows {
        for &&(field, kind) in &checks {
            let raw = row.get(field);
            let parsed = raw.is_some_and(|value| match kind {
                FieldKind::Integer => parse_int_prefix(value).is_some(),
                FieldKind::Number => parse_float_prefix(value).is_some(),
                FieldKind::Flag => parse_flag(Some(value)).is_some(),
                FieldKind::Date => parse_call_date(value).is_some(),
            });

            if !parsed {
                issues.push(ParseIssue {
                    line: row.line,
                    field: field.to_string(),
                    expected: kind,
                    raw: raw.map(str::to_string),
                });
            }
        }
    }

    if !issues.is_empty() {
        debug!("Collected {} parse issues", issues.len());
    }
    issues
}
