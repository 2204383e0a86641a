//! Chart.js configuration builders.
//!
//! Each panel becomes a [`ChartSpec`] whose `config` is a plain Chart.js
//! `{type, data, options}` object, or `None` when the panel has no data.

use crate::analysis::agent::{FlagCounts, Gauge};
use crate::analysis::aggregator::{
    SatisfactionHistogram, YearlySummary, AVG_HANDLING_TIME, TOTAL_CALLS,
};
use crate::analysis::{AgentDashboard, Dashboard, YearlyDashboard};
use crate::models::{Panel, Series};
use serde::Serialize;
use serde_json::{json, Value};

const SATISFACTION_COLORS: [&str; 5] = ["#e74c3c", "#f39c12", "#f1c40f", "#3498db", "#2ecc71"];

const FLAG_COLORS: [(&str, &str); 2] = [
    ("rgba(255, 111, 0, 0.6)", "rgba(255, 111, 0, 1)"),
    ("rgba(247, 147, 30, 0.6)", "rgba(247, 147, 30, 1)"),
];

const TREND_COLORS: [(&str, &str); 3] = [
    ("#ff6f00", "rgba(255, 111, 0, 0.2)"),
    ("#f7931e", "rgba(247, 147, 30, 0.2)"),
    ("#e74c3c", "rgba(231, 76, 60, 0.2)"),
];

/// One chart on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Canvas id, unique within a report.
    pub id: String,
    pub title: String,
    /// Chart.js config, `None` renders a "No data" placeholder.
    pub config: Option<Value>,
}

impl ChartSpec {
    fn from_panel<T>(id: &str, title: &str, panel: &Panel<T>, build: impl FnOnce(&T) -> Value) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            config: panel.as_ready().map(build),
        }
    }
}

/// All charts for a dashboard, in display order.
pub fn build_charts(dashboard: &Dashboard) -> Vec<ChartSpec> {
    match dashboard {
        Dashboard::Yearly(d) => yearly_charts(d),
        Dashboard::Agent(d) => agent_charts(d),
    }
}

fn yearly_charts(d: &YearlyDashboard) -> Vec<ChartSpec> {
    vec![
        ChartSpec::from_panel("yearly-performance", "Yearly Performance", &d.summary, performance_chart),
        ChartSpec::from_panel(
            "customer-satisfaction",
            "Customer Satisfaction",
            &d.satisfaction,
            |h| satisfaction_chart(h, "doughnut"),
        ),
        ChartSpec::from_panel(
            "satisfaction-share",
            "Satisfaction Share",
            &d.satisfaction,
            |h| satisfaction_chart(h, "pie"),
        ),
        ChartSpec::from_panel("kpi-averages", "Average KPI Scores", &d.kpi_averages, |s| {
            radar_chart(s, "rgba(52, 152, 219, 0.2)", "rgba(52, 152, 219, 1)", 5.0)
        }),
        ChartSpec::from_panel("handling-time", "Average Handling Time", &d.summary, handling_time_chart),
    ]
}

fn agent_charts(d: &AgentDashboard) -> Vec<ChartSpec> {
    let mut charts = Vec::new();

    match &d.gauges {
        Panel::Ready(gauges) => {
            for (i, gauge) in gauges.iter().enumerate() {
                charts.push(ChartSpec {
                    id: format!("gauge-{}", i),
                    title: gauge.label.clone(),
                    config: Some(gauge_chart(gauge)),
                });
            }
        }
        Panel::NoData => {
            for (i, (_, label)) in crate::analysis::agent::TREND_METRICS.iter().enumerate() {
                charts.push(ChartSpec {
                    id: format!("gauge-{}", i),
                    title: label.to_string(),
                    config: None,
                });
            }
        }
    }

    charts.push(ChartSpec::from_panel("kpi-trend", "KPI Trends Over Time", &d.trend, trend_chart));
    charts.push(ChartSpec::from_panel("overall-kpi", "Overall KPI Comparison", &d.overall, |s| {
        radar_chart(s, "rgba(255, 99, 132, 0.2)", "rgba(255, 99, 132, 1)", 1.0)
    }));
    charts.push(ChartSpec::from_panel(
        "kpi-distribution",
        "KPI Distribution",
        &d.flags,
        flag_chart,
    ));

    charts
}

/// Bar of total calls with the handling time as a line on a second axis.
pub fn performance_chart(summary: &YearlySummary) -> Value {
    let series = summary.as_series();
    let calls = series.values(TOTAL_CALLS).unwrap_or_default();
    let minutes = series.values(AVG_HANDLING_TIME).unwrap_or_default();
    json!({
        "type": "bar",
        "data": {
            "labels": series.labels,
            "datasets": [
                {
                    "label": TOTAL_CALLS,
                    "data": calls,
                    "backgroundColor": "rgba(106, 90, 205, 0.2)",
                    "borderColor": "rgba(106, 90, 205, 1)",
                    "borderWidth": 1,
                    "yAxisID": "calls"
                },
                {
                    "label": AVG_HANDLING_TIME,
                    "data": minutes,
                    "backgroundColor": "rgba(255, 206, 86, 0.2)",
                    "borderColor": "rgba(255, 206, 86, 1)",
                    "borderWidth": 1,
                    "type": "line",
                    "yAxisID": "minutes"
                }
            ]
        },
        "options": {
            "responsive": true,
            "scales": {
                "calls": { "type": "linear", "position": "left", "beginAtZero": true },
                "minutes": { "type": "linear", "position": "right", "beginAtZero": true }
            }
        }
    })
}

pub fn satisfaction_chart(histogram: &SatisfactionHistogram, kind: &str) -> Value {
    let series = histogram.as_series();
    json!({
        "type": kind,
        "data": {
            "labels": series.labels,
            "datasets": [{
                "label": series.datasets[0].name,
                "data": series.datasets[0].values,
                "backgroundColor": SATISFACTION_COLORS
            }]
        },
        "options": { "responsive": true }
    })
}

pub fn radar_chart(series: &Series, fill: &str, line: &str, max: f64) -> Value {
    let chart_datasets: Vec<Value> = series
        .datasets
        .iter()
        .map(|d| {
            json!({
                "label": d.name,
                "data": d.values,
                "backgroundColor": fill,
                "borderColor": line,
                "borderWidth": 1
            })
        })
        .collect();

    json!({
        "type": "radar",
        "data": { "labels": series.labels, "datasets": chart_datasets },
        "options": {
            "responsive": true,
            "scales": { "r": { "beginAtZero": true, "suggestedMax": max } }
        }
    })
}

pub fn handling_time_chart(summary: &YearlySummary) -> Value {
    json!({
        "type": "line",
        "data": {
            "labels": summary.years,
            "datasets": [{
                "label": AVG_HANDLING_TIME,
                "data": summary.avg_handling_time,
                "backgroundColor": "rgba(231, 76, 60, 0.2)",
                "borderColor": "rgba(231, 76, 60, 1)",
                "fill": true
            }]
        },
        "options": { "responsive": true }
    })
}

/// Two-slice doughnut with the empty slice greyed out.
pub fn gauge_chart(gauge: &Gauge) -> Value {
    json!({
        "type": "doughnut",
        "data": {
            "labels": [gauge.label, ""],
            "datasets": [{
                "data": gauge.slices(),
                "backgroundColor": [gauge.tone.color(), "#ecf0f1"],
                "borderWidth": 0
            }]
        },
        "options": {
            "cutout": "80%",
            "rotation": -90,
            "circumference": 180,
            "plugins": {
                "legend": { "display": false },
                "tooltip": { "enabled": false }
            }
        }
    })
}

pub fn trend_chart(series: &Series) -> Value {
    let chart_datasets: Vec<Value> = series
        .datasets
        .iter()
        .zip(TREND_COLORS.iter().cycle())
        .map(|(d, (line, fill))| {
            json!({
                "label": d.name,
                "data": d.values,
                "borderColor": line,
                "backgroundColor": fill,
                "fill": false,
                "tension": 0.3
            })
        })
        .collect();

    json!({
        "type": "line",
        "data": { "labels": series.labels, "datasets": chart_datasets },
        "options": {
            "responsive": true,
            "scales": { "y": { "beginAtZero": true, "suggestedMax": 1 } }
        }
    })
}

pub fn flag_chart(flags: &FlagCounts) -> Value {
    let series = flags.as_series();
    let chart_datasets: Vec<Value> = series
        .datasets
        .iter()
        .zip(FLAG_COLORS.iter())
        .map(|(d, (fill, line))| {
            json!({
                "label": d.name,
                "data": d.values,
                "backgroundColor": fill,
                "borderColor": line,
                "borderWidth": 1
            })
        })
        .collect();

    json!({
        "type": "bar",
        "data": { "labels": series.labels, "datasets": chart_datasets },
        "options": {
            "responsive": true,
            "scales": { "y": { "beginAtZero": true, "ticks": { "precision": 0 } } }
        }
    })
}
