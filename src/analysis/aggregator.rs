//! Yearly call-volume aggregation.
//!
//! Groups rows by `Year` and computes call totals, average handling time,
//! the customer-satisfaction histogram and the average KPI scores.

use crate::analysis::stats::{format_fixed, mean, round_to};
use crate::dataset::values::{float_or_zero, int_or_zero, parse_int_prefix};
use crate::error::DashError;
use crate::models::{Row, Series};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const YEAR: &str = "Year";
pub const CALLS_HANDLED: &str = "Calls_Handled";
pub const AVERAGE_HANDLING_TIME: &str = "Average_Handling_Time";
pub const CUSTOMER_SATISFACTION: &str = "Customer_Satisfaction";

/// KPI columns of the yearly export and their display labels.
pub const KPI_FIELDS: [(&str, &str); 4] = [
    ("Listening_Skill", "Listening Skill"),
    ("Clarity_of_Speech", "Clarity of Speech"),
    ("Agent_Enthusiasm", "Agent Enthusiasm"),
    ("Agent_Empathy", "Agent Empathy"),
];

/// Series names of the yearly performance chart.
pub const TOTAL_CALLS: &str = "Total Calls Handled";
pub const AVG_HANDLING_TIME: &str = "Avg Handling Time (mins)";

pub const SATISFACTION_LABELS: [&str; 5] = [
    "Very Unsatisfied",
    "Unsatisfied",
    "Neutral",
    "Satisfied",
    "Very Satisfied",
];

/// Per-year totals and averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySummary {
    /// Distinct years in order of first appearance.
    pub years: Vec<String>,
    /// Sum of `Calls_Handled` per year.
    pub total_calls: Vec<i64>,
    /// Mean `Average_Handling_Time` per year, rounded to 2 decimals.
    pub avg_handling_time: Vec<f64>,
    /// Sum of all per-year totals.
    pub grand_total_calls: i64,
    /// Mean `Average_Handling_Time` over every row.
    pub overall_avg_handling_time: f64,
}

impl YearlySummary {
    /// Per-year averages as 2-decimal strings (`"6.00"`, or `"NaN"` for an empty year).
    pub fn avg_handling_time_labels(&self) -> Vec<String> {
        self.avg_handling_time
            .iter()
            .map(|v| format_fixed(*v, 2))
            .collect()
    }

    /// Overall average handling time, e.g. `"6.00 mins"`.
    pub fn overall_avg_handling_time_label(&self) -> String {
        format!("{} mins", format_fixed(self.overall_avg_handling_time, 2))
    }

    pub fn as_series(&self) -> Series {
        Series::new(self.years.clone())
            .with_values(
                TOTAL_CALLS,
                self.total_calls.iter().map(|c| *c as f64).collect(),
            )
            .with_values(AVG_HANDLING_TIME, self.avg_handling_time.clone())
    }
}

/// How to treat satisfaction scores outside 1..=5.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    /// Leave the value out of every bucket and count it separately.
    #[default]
    Drop,
    /// Move numeric values to the nearest bucket; non-numeric values are dropped.
    Clamp,
    /// Fail the dashboard build.
    Reject,
}

/// Customer satisfaction counts for scores 1 to 5.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SatisfactionHistogram {
    pub counts: [usize; 5],
    /// Rows whose score was missing, non-numeric or out of range and dropped.
    pub out_of_range: usize,
}

impl SatisfactionHistogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn as_series(&self) -> Series {
        Series::new(SATISFACTION_LABELS.iter().map(|s| s.to_string()).collect()).with_values(
            "Customers",
            self.counts.iter().map(|c| *c as f64).collect(),
        )
    }
}

/// Partition rows by `Year`, keeping the order in which years first appear.
pub fn group_by_year<'a>(rows: &[&'a Row]) -> Vec<(String, Vec<&'a Row>)> {
    let mut groups: Vec<(String, Vec<&'a Row>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for &row in rows {
        let year = row.get(YEAR).unwrap_or_default().to_string();
        match index.get(&year) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(year.clone(), groups.len());
                groups.push((year, vec![row]));
            }
        }
    }

    groups
}

/// Sum of `Calls_Handled`, unparseable values counting as 0.
/// Saturates at the `i64` bounds.
pub fn total_calls(rows: &[&Row]) -> i64 {
    rows.iter()
        .map(|r| int_or_zero(r.get(CALLS_HANDLED)))
        .fold(0, i64::saturating_add)
}

/// Mean of `Average_Handling_Time`, unparseable values counting as 0.
/// NaN for an empty slice.
pub fn mean_handling_time(rows: &[&Row]) -> f64 {
    let values: Vec<f64> = rows
        .iter()
        .map(|r| float_or_zero(r.get(AVERAGE_HANDLING_TIME)))
        .collect();
    mean(&values)
}

/// Compute per-year call totals and handling-time averages.
pub fn yearly_summary(rows: &[&Row]) -> YearlySummary {
    let groups = group_by_year(rows);
    debug!("Grouped {} rows into {} years", rows.len(), groups.len());

    let years = groups.iter().map(|(year, _)| year.clone()).collect();
    let total_calls_per_year: Vec<i64> = groups.iter().map(|(_, g)| total_calls(g)).collect();
    let avg_handling_time = groups
        .iter()
        .map(|(_, g)| round_to(mean_handling_time(g), 2))
        .collect();

    YearlySummary {
        years,
        grand_total_calls: total_calls_per_year.iter().copied().fold(0, i64::saturating_add),
        total_calls: total_calls_per_year,
        avg_handling_time,
        overall_avg_handling_time: mean_handling_time(rows),
    }
}

/// Bucket rows by `Customer_Satisfaction` (1 to 5).
pub fn satisfaction_histogram(
    rows: &[&Row],
    policy: OutOfRangePolicy,
) -> Result<SatisfactionHistogram, DashError> {
    let mut histogram = SatisfactionHistogram::default();

    for row in rows {
        let raw = row.get(CUSTOMER_SATISFACTION);
        let score = raw.and_then(parse_int_prefix);

        match score {
            Some(v) if (1..=5).contains(&v) => histogram.counts[(v - 1) as usize] += 1,
            _ => match policy {
                OutOfRangePolicy::Drop => histogram.out_of_range += 1,
                OutOfRangePolicy::Clamp => match score {
                    Some(v) => histogram.counts[(v.clamp(1, 5) - 1) as usize] += 1,
                    None => histogram.out_of_range += 1,
                },
                OutOfRangePolicy::Reject => {
                    return Err(DashError::SatisfactionOutOfRange {
                        line: row.line,
                        raw: raw.unwrap_or_default().to_string(),
                    });
                }
            },
        }
    }

    if histogram.out_of_range > 0 {
        debug!(
            "{} satisfaction scores outside 1-5 were dropped",
            histogram.out_of_range
        );
    }

    Ok(histogram)
}

/// Average of each yearly KPI column over all rows, rounded to 2 decimals.
pub fn kpi_averages(rows: &[&Row]) -> Series {
    let labels = KPI_FIELDS.iter().map(|(_, label)| label.to_string()).collect();
    let values = KPI_FIELDS
        .iter()
        .map(|(field, _)| {
            let scores: Vec<f64> = rows
                .iter()
                .map(|r| int_or_zero(r.get(field)) as f64)
                .collect();
            round_to(mean(&scores), 2)
        })
        .collect();

    Series::new(labels).with_values("Average KPI Score", values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yearly_row(line: usize, year: &str, calls: &str, aht: &str) -> Row {
        Row::from_pairs(
            line,
            [
                (YEAR, year),
                (CALLS_HANDLED, calls),
                (AVERAGE_HANDLING_TIME, aht),
            ],
        )
    }

    fn satisfaction_row(line: usize, score: &str) -> Row {
        Row::from_pairs(line, [(CUSTOMER_SATISFACTION, score)])
    }

    #[test]
    fn test_concrete_yearly_scenario() {
        let rows = vec![
            yearly_row(2, "2023", "10", "5.0"),
            yearly_row(3, "2023", "20", "7.0"),
            yearly_row(4, "2024", "15", "6.0"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let summary = yearly_summary(&refs);

        assert_eq!(summary.years, vec!["2023", "2024"]);
        assert_eq!(summary.total_calls, vec![30, 15]);
        assert_eq!(summary.avg_handling_time_labels(), vec!["6.00", "6.00"]);
        assert_eq!(summary.grand_total_calls, 45);
        assert_eq!(summary.overall_avg_handling_time_label(), "6.00 mins");
    }

    #[test]
    fn test_group_by_year_first_appearance_order() {
        let rows = vec![
            yearly_row(2, "2024", "1", "1"),
            yearly_row(3, "2022", "1", "1"),
            yearly_row(4, "2024", "1", "1"),
            yearly_row(5, "2023", "1", "1"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let groups = group_by_year(&refs);
        let years: Vec<&str> = groups.iter().map(|(y, _)| y.as_str()).collect();
        assert_eq!(years, vec!["2024", "2022", "2023"]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_sum_invariant() {
        let rows = vec![
            yearly_row(2, "2021", "7", "1"),
            yearly_row(3, "2022", "11", "1"),
            yearly_row(4, "2021", "x", "1"),
            yearly_row(5, "2023", "4", "1"),
            yearly_row(6, "2022", "9", "1"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let summary = yearly_summary(&refs);
        assert_eq!(summary.total_calls.iter().sum::<i64>(), total_calls(&refs));
        assert_eq!(summary.grand_total_calls, 31);
    }

    #[test]
    fn test_huge_call_counts_saturate() {
        let rows = vec![
            yearly_row(2, "2023", "9000000000000000000", "1"),
            yearly_row(3, "2023", "9000000000000000000", "1"),
            yearly_row(4, "2024", "99999999999999999999", "1"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let summary = yearly_summary(&refs);
        assert_eq!(summary.total_calls, vec![i64::MAX, i64::MAX]);
        assert_eq!(summary.grand_total_calls, i64::MAX);
    }

    #[test]
    fn test_unparseable_values_default_to_zero() {
        let rows = vec![
            yearly_row(2, "2023", "", ""),
            yearly_row(3, "2023", "abc", "n/a"),
            yearly_row(4, "2023", "12.9", "4.0"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let summary = yearly_summary(&refs);
        assert_eq!(summary.total_calls, vec![12]);
        // (0 + 0 + 4) / 3
        assert_eq!(summary.avg_handling_time_labels(), vec!["1.33"]);
    }

    #[test]
    fn test_empty_group_yields_nan() {
        assert!(mean_handling_time(&[]).is_nan());

        let summary = yearly_summary(&[]);
        assert!(summary.years.is_empty());
        assert_eq!(summary.grand_total_calls, 0);
        assert_eq!(summary.overall_avg_handling_time_label(), "NaN mins");
    }

    #[test]
    fn test_histogram_conservation() {
        let rows: Vec<Row> = ["1", "2", "2", "3", "5", "5", "5", "4"]
            .iter()
            .enumerate()
            .map(|(i, s)| satisfaction_row(i + 2, s))
            .collect();
        let refs: Vec<&Row> = rows.iter().collect();

        let histogram = satisfaction_histogram(&refs, OutOfRangePolicy::Drop).unwrap();
        assert_eq!(histogram.counts, [1, 2, 1, 1, 3]);
        assert_eq!(histogram.total(), rows.len());
        assert_eq!(histogram.out_of_range, 0);
    }

    #[test]
    fn test_histogram_drop_policy() {
        let rows: Vec<Row> = ["3", "0", "6", "abc", ""]
            .iter()
            .enumerate()
            .map(|(i, s)| satisfaction_row(i + 2, s))
            .collect();
        let refs: Vec<&Row> = rows.iter().collect();

        let histogram = satisfaction_histogram(&refs, OutOfRangePolicy::Drop).unwrap();
        assert_eq!(histogram.counts, [0, 0, 1, 0, 0]);
        assert_eq!(histogram.out_of_range, 4);
    }

    #[test]
    fn test_histogram_clamp_policy() {
        let rows: Vec<Row> = ["0", "9", "abc"]
            .iter()
            .enumerate()
            .map(|(i, s)| satisfaction_row(i + 2, s))
            .collect();
        let refs: Vec<&Row> = rows.iter().collect();

        let histogram = satisfaction_histogram(&refs, OutOfRangePolicy::Clamp).unwrap();
        assert_eq!(histogram.counts, [1, 0, 0, 0, 1]);
        assert_eq!(histogram.out_of_range, 1);
    }

    #[test]
    fn test_histogram_reject_policy() {
        let rows = vec![satisfaction_row(2, "4"), satisfaction_row(3, "7")];
        let refs: Vec<&Row> = rows.iter().collect();

        match satisfaction_histogram(&refs, OutOfRangePolicy::Reject) {
            Err(DashError::SatisfactionOutOfRange { line, raw }) => {
                assert_eq!(line, 3);
                assert_eq!(raw, "7");
            }
            other => panic!("expected SatisfactionOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_kpi_averages() {
        let rows = vec![
            Row::from_pairs(
                2,
                [
                    ("Listening_Skill", "4"),
                    ("Clarity_of_Speech", "5"),
                    ("Agent_Enthusiasm", "3"),
                    ("Agent_Empathy", "2"),
                ],
            ),
            Row::from_pairs(
                3,
                [
                    ("Listening_Skill", "5"),
                    ("Clarity_of_Speech", "4"),
                    ("Agent_Enthusiasm", ""),
                    ("Agent_Empathy", "3"),
                ],
            ),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let series = kpi_averages(&refs);
        assert_eq!(
            series.labels,
            vec![
                "Listening Skill",
                "Clarity of Speech",
                "Agent Enthusiasm",
                "Agent Empathy"
            ]
        );
        assert_eq!(
            series.values("Average KPI Score"),
            Some(&[4.5, 4.5, 1.5, 2.5][..])
        );
    }
}
