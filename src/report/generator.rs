//! Markdown and JSON report generation.
//!
//! The Markdown report lays each dashboard panel out as a section with a
//! table of the series behind the chart.

use super::Report;
use crate::analysis::agent::{FlagCounts, Gauge};
use crate::analysis::aggregator::{SatisfactionHistogram, YearlySummary, SATISFACTION_LABELS};
use crate::analysis::stats::format_fixed;
use crate::analysis::table::DetailTable;
use crate::analysis::{AgentDashboard, Dashboard, YearlyDashboard};
use crate::models::{Panel, ParseIssue, ReadWarning, ReportMetadata, Series};
use anyhow::Result;

const NO_DATA: &str = "_No data_\n\n";
const MAX_LISTED_ISSUES: usize = 50;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.metadata.title));
    output.push_str(&generate_metadata_section(&report.metadata));

    match &report.dashboard {
        Dashboard::Yearly(d) => output.push_str(&generate_yearly_sections(d)),
        Dashboard::Agent(d) => output.push_str(&generate_agent_sections(d, report.max_table_rows)),
    }

    output.push_str(&generate_data_quality_section(
        &report.metadata.read_warnings,
        report.dashboard.parse_issues(),
    ));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!("- **Dashboard:** {}\n", metadata.variant));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **As of:** {}\n", metadata.as_of.format("%Y-%m-%d")));
    section.push_str(&format!("- **Rows:** {}\n", metadata.total_rows));
    if !metadata.read_warnings.is_empty() {
        section.push_str(&format!(
            "- **Skipped Records:** {}\n",
            metadata.read_warnings.len()
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_yearly_sections(d: &YearlyDashboard) -> String {
    let mut section = String::new();

    section.push_str("## Yearly Performance\n\n");
    match &d.summary {
        Panel::Ready(summary) => section.push_str(&yearly_table(summary)),
        Panel::NoData => section.push_str(NO_DATA),
    }

    section.push_str("## Customer Satisfaction\n\n");
    match &d.satisfaction {
        Panel::Ready(histogram) => section.push_str(&satisfaction_table(histogram)),
        Panel::NoData => section.push_str(NO_DATA),
    }

    section.push_str("## Average KPI Scores\n\n");
    match &d.kpi_averages {
        Panel::Ready(series) => section.push_str(&series_table("KPI", series)),
        Panel::NoData => section.push_str(NO_DATA),
    }

    section
}

fn yearly_table(summary: &YearlySummary) -> String {
    let mut table = String::new();

    table.push_str("| Year | Total Calls Handled | Avg Handling Time (mins) |\n");
    table.push_str("|------|--------------------:|-------------------------:|\n");
    for ((year, calls), aht) in summary
        .years
        .iter()
        .zip(&summary.total_calls)
        .zip(summary.avg_handling_time_labels())
    {
        table.push_str(&format!("| {} | {} | {} |\n", escape_cell(year), calls, aht));
    }
    table.push('\n');

    table.push_str(&format!(
        "**Total Calls Handled:** {}  \n",
        summary.grand_total_calls
    ));
    table.push_str(&format!(
        "**Average Handling Time:** {}\n\n",
        summary.overall_avg_handling_time_label()
    ));

    table
}

fn satisfaction_table(histogram: &SatisfactionHistogram) -> String {
    let mut table = String::new();

    table.push_str("| Score | Rating | Customers |\n");
    table.push_str("|------:|--------|----------:|\n");
    for (i, (label, count)) in SATISFACTION_LABELS.iter().zip(histogram.counts).enumerate() {
        table.push_str(&format!("| {} | {} | {} |\n", i + 1, label, count));
    }
    table.push('\n');
    table.push_str(&format!("**Customers Counted:** {}\n\n", histogram.total()));

    if histogram.out_of_range > 0 {
        table.push_str(&format!(
            "⚠️ {} scores outside 1-5 were not counted.\n\n",
            histogram.out_of_range
        ));
    }

    table
}

/// Label column plus one column per dataset.
fn series_table(label_header: &str, series: &Series) -> String {
    let mut table = String::new();

    table.push_str(&format!("| {} |", escape_cell(label_header)));
    for dataset in &series.datasets {
        table.push_str(&format!(" {} |", escape_cell(&dataset.name)));
    }
    table.push('\n');

    table.push_str("|---|");
    for _ in &series.datasets {
        table.push_str("---:|");
    }
    table.push('\n');

    for (i, label) in series.labels.iter().enumerate() {
        table.push_str(&format!("| {} |", escape_cell(label)));
        for dataset in &series.datasets {
            table.push_str(&format!(" {} |", format_fixed(dataset.values[i], 2)));
        }
        table.push('\n');
    }
    table.push('\n');

    table
}

fn generate_agent_sections(d: &AgentDashboard, max_rows: Option<usize>) -> String {
    let mut section = String::new();

    section.push_str("## Filters\n\n");
    section.push_str(&format!("- **Selection:** {}\n", d.filters.describe()));
    if let Some(cutoff) = d.cutoff {
        section.push_str(&format!(
            "- **Calls Since:** {}\n",
            cutoff.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    section.push_str(&format!(
        "- **Matching Calls:** {} of {}\n\n",
        d.filtered_rows, d.total_rows
    ));

    section.push_str("## KPI Gauges\n\n");
    section.push_str(&gauge_list(&d.gauges));

    section.push_str("## KPI Trends Over Time\n\n");
    match &d.trend {
        Panel::Ready(series) if !series.labels.is_empty() => {
            section.push_str(&series_table("Date", series))
        }
        _ => section.push_str(NO_DATA),
    }

    section.push_str("## Overall KPI Comparison\n\n");
    match &d.overall {
        Panel::Ready(series) => section.push_str(&series_table("KPI", series)),
        Panel::NoData => section.push_str(NO_DATA),
    }

    section.push_str("## KPI Distribution\n\n");
    match &d.flags {
        Panel::Ready(flags) => section.push_str(&flag_table(flags)),
        Panel::NoData => section.push_str(NO_DATA),
    }

    section.push_str("## Agent Details\n\n");
    match &d.table {
        Panel::Ready(table) => section.push_str(&detail_table(table, max_rows)),
        Panel::NoData => section.push_str(NO_DATA),
    }

    section
}

fn gauge_list(gauges: &Panel<Vec<Gauge>>) -> String {
    let mut list = String::new();

    match gauges {
        Panel::Ready(gauges) => {
            for gauge in gauges {
                list.push_str(&format!(
                    "- {} **{}:** {}\n",
                    gauge.tone.emoji(),
                    gauge.label,
                    gauge.display()
                ));
            }
        }
        Panel::NoData => {
            for (_, label) in crate::analysis::agent::TREND_METRICS {
                list.push_str(&format!("- **{}:** N/A\n", label));
            }
        }
    }
    list.push('\n');

    list
}

fn flag_table(flags: &FlagCounts) -> String {
    let mut table = String::new();

    table.push_str("| KPI | True | False |\n");
    table.push_str("|-----|-----:|------:|\n");
    for ((label, t), f) in flags
        .labels
        .iter()
        .zip(&flags.true_counts)
        .zip(&flags.false_counts)
    {
        table.push_str(&format!("| {} | {} | {} |\n", label, t, f));
    }
    table.push('\n');

    table
}

fn detail_table(table: &DetailTable, max_rows: Option<usize>) -> String {
    let mut out = String::new();
    let shown = max_rows.unwrap_or(table.rows.len()).min(table.rows.len());

    out.push_str(&format!("| {} |\n", table.columns.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(table.columns.len())));
    for row in &table.rows[..shown] {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| match cell.tone {
                Some(tone) => format!("{} {}", tone.emoji(), escape_cell(&cell.value)),
                None => escape_cell(&cell.value),
            })
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out.push('\n');

    if shown < table.rows.len() {
        out.push_str(&format!(
            "_{} more rows not shown._\n\n",
            table.rows.len() - shown
        ));
    }

    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn generate_data_quality_section(warnings: &[ReadWarning], issues: &[ParseIssue]) -> String {
    if warnings.is_empty() && issues.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Data Quality\n\n");

    for warning in warnings {
        section.push_str(&format!(
            "- Line {}: record skipped ({})\n",
            warning.line, warning.message
        ));
    }

    for issue in issues.iter().take(MAX_LISTED_ISSUES) {
        let raw = match &issue.raw {
            Some(raw) => format!("`{}`", raw),
            None => "missing".to_string(),
        };
        section.push_str(&format!(
            "- Line {}: `{}` is {}, expected {}\n",
            issue.line, issue.field, raw, issue.expected
        ));
    }
    if issues.len() > MAX_LISTED_ISSUES {
        section.push_str(&format!(
            "- ... and {} more\n",
            issues.len() - MAX_LISTED_ISSUES
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by kpidash v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
