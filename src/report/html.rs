//! Self-contained HTML dashboard.
//!
//! The page is rendered from `templates/dashboard.html`, which escapes every
//! interpolated value. Chart configs are embedded as JSON and drawn with
//! Chart.js from a CDN. Every chart instance lives in a registry keyed by
//! canvas id; drawing a chart again destroys the previous instance first.

use super::charts::ChartSpec;
use super::Report;
use crate::analysis::table::DetailTable;
use crate::analysis::Dashboard;
use crate::models::{Panel, ParseIssue, ReadWarning, Variant};
use anyhow::Result;
use askama::Template;

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage<'a> {
    title: &'a str,
    chart_js_cdn: &'a str,
    variant: Variant,
    source: &'a str,
    generated_at: String,
    as_of: String,
    total_rows: usize,
    is_agent: bool,
    selection: String,
    filtered_rows: usize,
    stat_cards: Vec<StatCard>,
    cards: Vec<ChartCard<'a>>,
    has_table: bool,
    columns: Vec<&'a str>,
    rows: Vec<Vec<CellView<'a>>>,
    hidden_rows: usize,
    warning_count: usize,
    issue_count: usize,
    quality_lines: Vec<String>,
    charts_json: String,
}

struct StatCard {
    title: &'static str,
    value: String,
}

struct ChartCard<'a> {
    id: &'a str,
    title: &'a str,
    has_chart: bool,
    /// Headline value under the chart, empty for none.
    value: String,
}

struct CellView<'a> {
    value: &'a str,
    /// CSS color, empty for untoned cells.
    color: &'static str,
}

/// Generate the HTML dashboard.
pub fn generate_html_report(report: &Report) -> Result<String> {
    let metadata = &report.metadata;

    let mut page = DashboardPage {
        title: &metadata.title,
        chart_js_cdn: CHART_JS_CDN,
        variant: metadata.variant,
        source: &metadata.source,
        generated_at: metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        as_of: metadata.as_of.format("%Y-%m-%d").to_string(),
        total_rows: metadata.total_rows,
        is_agent: false,
        selection: String::new(),
        filtered_rows: 0,
        stat_cards: Vec::new(),
        cards: Vec::new(),
        has_table: false,
        columns: Vec::new(),
        rows: Vec::new(),
        hidden_rows: 0,
        warning_count: metadata.read_warnings.len(),
        issue_count: report.dashboard.parse_issues().len(),
        quality_lines: quality_lines(&metadata.read_warnings, report.dashboard.parse_issues()),
        charts_json: embed_json(&report.charts)?,
    };

    match &report.dashboard {
        Dashboard::Yearly(d) => {
            if let Panel::Ready(summary) = &d.summary {
                page.stat_cards = vec![
                    StatCard {
                        title: "Total Calls Handled",
                        value: summary.grand_total_calls.to_string(),
                    },
                    StatCard {
                        title: "Average Handling Time",
                        value: summary.overall_avg_handling_time_label(),
                    },
                ];
            }
            page.cards = report.charts.iter().map(|c| chart_card(c, String::new())).collect();
        }
        Dashboard::Agent(d) => {
            page.is_agent = true;
            page.selection = d.filters.describe();
            page.filtered_rows = d.filtered_rows;
            page.cards = report
                .charts
                .iter()
                .enumerate()
                .map(|(i, chart)| {
                    let value = match &d.gauges {
                        Panel::Ready(gauges) if chart.id.starts_with("gauge-") => {
                            gauges.get(i).map(|g| g.display()).unwrap_or_default()
                        }
                        Panel::NoData if chart.id.starts_with("gauge-") => "N/A".to_string(),
                        _ => String::new(),
                    };
                    chart_card(chart, value)
                })
                .collect();

            if let Panel::Ready(table) = &d.table {
                fill_table(&mut page, table, report.max_table_rows);
            }
        }
    }

    Ok(page.render()?)
}

fn chart_card(chart: &ChartSpec, value: String) -> ChartCard<'_> {
    ChartCard {
        id: &chart.id,
        title: &chart.title,
        has_chart: chart.config.is_some(),
        value,
    }
}

fn fill_table<'a>(page: &mut DashboardPage<'a>, table: &'a DetailTable, max_rows: Option<usize>) {
    let shown = max_rows.unwrap_or(table.rows.len()).min(table.rows.len());

    page.has_table = true;
    page.columns = table.columns.iter().map(String::as_str).collect();
    page.rows = table.rows[..shown]
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| CellView {
                    value: &cell.value,
                    color: cell.tone.map(|t| t.color()).unwrap_or_default(),
                })
                .collect()
        })
        .collect();
    page.hidden_rows = table.rows.len() - shown;
}

fn quality_lines(warnings: &[ReadWarning], issues: &[ParseIssue]) -> Vec<String> {
    let skipped = warnings
        .iter()
        .map(|w| format!("Line {}: {}", w.line, w.message));
    let unparseable = issues.iter().map(|issue| {
        format!(
            "Line {}: {} = {}, expected {}",
            issue.line,
            issue.field,
            issue.raw.as_deref().unwrap_or("(missing)"),
            issue.expected
        )
    });
    skipped.chain(unparseable).collect()
}

/// Serialize for a `<script>` block; `</` is escaped so no value can close it.
fn embed_json(charts: &[ChartSpec]) -> Result<String> {
    Ok(serde_json::to_string(charts)?.replace("</", "<\\/"))
}
