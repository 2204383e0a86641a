//! Row filtering by time window and grouping level.

use crate::analysis::agent::CALL_DATE;
use crate::dataset::values::parse_call_date;
use crate::models::{Dataset, FilterState, GroupingLevel, Row, TimeWindow};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Keep rows whose `CallDate` falls at or after the window's cutoff.
///
/// All-time uses the Unix epoch as its cutoff and keeps rows whose date
/// cannot be parsed. Any other window drops them.
pub fn filter_by_time_window<'a>(
    rows: &[&'a Row],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<&'a Row> {
    let cutoff = window.cutoff(now);
    debug!("Filtering calls from {}", cutoff.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));

    rows.iter()
        .copied()
        .filter(|row| {
            let date = row.get(CALL_DATE).and_then(parse_call_date);
            match (cutoff, date) {
                (Some(cutoff), Some(date)) => date >= cutoff,
                (Some(_), None) => false,
                (None, Some(date)) => date >= DateTime::<Utc>::UNIX_EPOCH,
                (None, None) => true,
            }
        })
        .collect()
}

/// Keep rows whose team or agent identifier equals `value` exactly.
/// The enterprise level keeps everything.
pub fn filter_by_grouping<'a>(rows: &[&'a Row], level: GroupingLevel, value: &str) -> Vec<&'a Row> {
    match level.id_column() {
        None => rows.to_vec(),
        Some(column) => rows
            .iter()
            .copied()
            .filter(|row| row.get(column) == Some(value))
            .collect(),
    }
}

/// Apply the time window, then the grouping filter.
pub fn apply_filters<'a>(
    dataset: &'a Dataset,
    filters: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Row> {
    let all: Vec<&Row> = dataset.rows.iter().collect();
    let in_window = filter_by_time_window(&all, filters.time_window, now);
    let filtered = filter_by_grouping(&in_window, filters.level, &filters.level_value);

    debug!(
        "Filters [{}] kept {} of {} rows",
        filters.describe(),
        filtered.len(),
        dataset.len()
    );
    filtered
}
