//! Per-call agent KPI aggregation.
//!
//! Everything here works on the already-filtered rows of the agent export.
//! Metric values are parsed without a default, so a non-numeric value turns
//! into NaN and carries through every mean it takes part in.

use crate::analysis::stats::{format_fixed, mean};
use crate::dataset::values::{flag_score, float_or_nan, parse_call_date, parse_flag};
use crate::models::{Row, Series};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AGENT_ID: &str = "AgentID";
pub const TEAM_ID: &str = "TeamID";
pub const CALL_DATE: &str = "CallDate";
pub const CALL_SENTIMENT: &str = "CallSentiment";
pub const AGENT_ENTHUSIASM: &str = "AgentEnthusiasm";
pub const EMPATHY: &str = "Empathy";
pub const CALL_CLARITY: &str = "CallClarity";
pub const RUDE_BEHAVIOUR: &str = "RudeBehaviour";
pub const IDENTIFIED_CUSTOMER: &str = "IdentifiedCustomer";
pub const ACCURATE_INFO: &str = "AccurateInfo";

/// Metrics shown as gauges and in the daily trend.
pub const TREND_METRICS: [(&str, &str); 3] = [
    (CALL_SENTIMENT, "Call Sentiment"),
    (AGENT_ENTHUSIASM, "Agent Enthusiasm"),
    (EMPATHY, "Empathy"),
];

/// Boolean-like fields counted in the KPI distribution.
pub const FLAG_FIELDS: [(&str, &str); 3] = [
    (RUDE_BEHAVIOUR, "Rude Behaviour"),
    (IDENTIFIED_CUSTOMER, "Identified Customer"),
    (ACCURATE_INFO, "Accurate Info"),
];

/// Score thresholds for colouring gauges and table cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// At or above this a score is good.
    pub good: f64,
    /// At or above this (and below `good`) a score needs attention.
    pub warn: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            good: 0.75,
            warn: 0.5,
        }
    }
}

impl Thresholds {
    /// Tone for a score. NaN compares false everywhere and lands on `Bad`.
    pub fn tone(&self, value: f64) -> Tone {
        if value >= self.good {
            Tone::Good
        } else if value >= self.warn {
            Tone::Warn
        } else {
            Tone::Bad
        }
    }
}

/// Traffic-light classification of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Good,
    Warn,
    Bad,
}

impl Tone {
    /// CSS colour used by the dashboards.
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Good => "#27ae60",
            Tone::Warn => "#f39c12",
            Tone::Bad => "#e74c3c",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Tone::Good => "🟢",
            Tone::Warn => "🟡",
            Tone::Bad => "🔴",
        }
    }
}

/// A single-value radial indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub label: String,
    pub value: f64,
    pub tone: Tone,
}

impl Gauge {
    /// Two-decimal display value.
    pub fn display(&self) -> String {
        format_fixed(self.value, 2)
    }

    /// Filled and empty slice of the doughnut.
    pub fn slices(&self) -> [f64; 2] {
        [self.value, 1.0 - self.value]
    }
}

/// True/false counts for each boolean-like field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagCounts {
    pub labels: Vec<String>,
    pub true_counts: Vec<usize>,
    pub false_counts: Vec<usize>,
}

impl FlagCounts {
    pub fn as_series(&self) -> Series {
        Series::new(self.labels.clone())
            .with_values("True", self.true_counts.iter().map(|c| *c as f64).collect())
            .with_values(
                "False",
                self.false_counts.iter().map(|c| *c as f64).collect(),
            )
    }
}

/// Mean of a metric over `rows`, without default substitution.
pub fn metric_mean(rows: &[&Row], field: &str) -> f64 {
    let values: Vec<f64> = rows.iter().map(|r| float_or_nan(r.get(field))).collect();
    mean(&values)
}

/// Daily means of the trend metrics, labelled by ISO date in ascending order.
/// Rows without a valid `CallDate` are left out.
pub fn kpi_trend(rows: &[&Row]) -> Series {
    let mut by_date: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
    for &row in rows {
        if let Some(date) = row.get(CALL_DATE).and_then(parse_call_date) {
            by_date
                .entry(date.format("%Y-%m-%d").to_string())
                .or_default()
                .push(row);
        }
    }

    let mut series = Series::new(by_date.keys().cloned().collect());
    for (field, label) in TREND_METRICS {
        let values = by_date.values().map(|day| metric_mean(day, field)).collect();
        series = series.with_values(label, values);
    }
    series
}

/// Count `true` and `false` values for each flag field. Other values count in neither.
pub fn flag_counts(rows: &[&Row]) -> FlagCounts {
    let mut counts = FlagCounts {
        labels: Vec::with_capacity(FLAG_FIELDS.len()),
        true_counts: Vec::with_capacity(FLAG_FIELDS.len()),
        false_counts: Vec::with_capacity(FLAG_FIELDS.len()),
    };

    for (field, label) in FLAG_FIELDS {
        let flags: Vec<Option<bool>> = rows.iter().map(|r| parse_flag(r.get(field))).collect();
        counts.labels.push(label.to_string());
        counts
            .true_counts
            .push(flags.iter().filter(|f| **f == Some(true)).count());
        counts
            .false_counts
            .push(flags.iter().filter(|f| **f == Some(false)).count());
    }

    counts
}

/// Overall KPI profile across the filtered set. Flags score 1 for `true`, 0 otherwise.
pub fn overall_kpi(rows: &[&Row]) -> Series {
    let flag_mean = |field: &str| {
        let values: Vec<f64> = rows.iter().map(|r| flag_score(r.get(field))).collect();
        mean(&values)
    };

    let points = [
        ("Call Sentiment", metric_mean(rows, CALL_SENTIMENT)),
        ("Agent Enthusiasm", metric_mean(rows, AGENT_ENTHUSIASM)),
        ("Empathy", metric_mean(rows, EMPATHY)),
        ("Rude Behaviour", flag_mean(RUDE_BEHAVIOUR)),
        ("Identified Customer", flag_mean(IDENTIFIED_CUSTOMER)),
        ("Accurate Info", flag_mean(ACCURATE_INFO)),
        ("Call Clarity", metric_mean(rows, CALL_CLARITY)),
    ];

    Series::new(points.iter().map(|(label, _)| label.to_string()).collect())
        .with_values("KPI Scores", points.iter().map(|(_, v)| *v).collect())
}

/// One gauge per trend metric.
pub fn gauges(rows: &[&Row], thresholds: &Thresholds) -> Vec<Gauge> {
    TREND_METRICS
        .iter()
        .map(|(field, label)| {
            let value = metric_mean(rows, field);
            Gauge {
                label: label.to_string(),
                value,
                tone: thresholds.tone(value),
            }
        })
        .collect()
}
