//! Agent-wise detail table.

use crate::analysis::agent::{
    Thresholds, Tone, ACCURATE_INFO, AGENT_ENTHUSIASM, AGENT_ID, CALL_CLARITY, CALL_SENTIMENT,
    EMPATHY, IDENTIFIED_CUSTOMER, RUDE_BEHAVIOUR,
};
use crate::dataset::values::{float_or_nan, parse_flag, parse_float_prefix};
use crate::models::Row;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Columns of the detail table, in display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortColumn {
    AgentId,
    CallSentiment,
    AgentEnthusiasm,
    Empathy,
    RudeBehaviour,
    IdentifiedCustomer,
    AccurateInfo,
    CallClarity,
}

impl SortColumn {
    pub const ALL: [SortColumn; 8] = [
        SortColumn::AgentId,
        SortColumn::CallSentiment,
        SortColumn::AgentEnthusiasm,
        SortColumn::Empathy,
        SortColumn::RudeBehaviour,
        SortColumn::IdentifiedCustomer,
        SortColumn::AccurateInfo,
        SortColumn::CallClarity,
    ];

    /// Source CSV column.
    pub fn field(&self) -> &'static str {
        match self {
            SortColumn::AgentId => AGENT_ID,
            SortColumn::CallSentiment => CALL_SENTIMENT,
            SortColumn::AgentEnthusiasm => AGENT_ENTHUSIASM,
            SortColumn::Empathy => EMPATHY,
            SortColumn::RudeBehaviour => RUDE_BEHAVIOUR,
            SortColumn::IdentifiedCustomer => IDENTIFIED_CUSTOMER,
            SortColumn::AccurateInfo => ACCURATE_INFO,
            SortColumn::CallClarity => CALL_CLARITY,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SortColumn::AgentId => "Agent ID",
            SortColumn::CallSentiment => "Call Sentiment",
            SortColumn::AgentEnthusiasm => "Enthusiasm",
            SortColumn::Empathy => "Empathy",
            SortColumn::RudeBehaviour => "Rude Behaviour",
            SortColumn::IdentifiedCustomer => "Identified Customer",
            SortColumn::AccurateInfo => "Accurate Info",
            SortColumn::CallClarity => "Call Clarity",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            SortColumn::CallSentiment
                | SortColumn::AgentEnthusiasm
                | SortColumn::Empathy
                | SortColumn::CallClarity
        )
    }

    fn tone(&self, raw: Option<&str>, thresholds: &Thresholds) -> Option<Tone> {
        match self {
            SortColumn::AgentId => None,
            SortColumn::RudeBehaviour => Some(if parse_flag(raw) == Some(true) {
                Tone::Bad
            } else {
                Tone::Good
            }),
            SortColumn::IdentifiedCustomer | SortColumn::AccurateInfo => {
                Some(if parse_flag(raw) == Some(true) {
                    Tone::Good
                } else {
                    Tone::Bad
                })
            }
            _ => Some(thresholds.tone(float_or_nan(raw))),
        }
    }
}

/// One table cell: the raw value and an optional tone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    /// Source line of the call.
    pub line: usize,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailTable {
    pub columns: Vec<String>,
    pub rows: Vec<DetailRow>,
}

impl DetailTable {
    /// Sort rows by `column`. Numeric columns compare as numbers with
    /// unparseable values last in either direction; the sort is stable.
    pub fn sort_by(&mut self, column: SortColumn, descending: bool) {
        let idx = column.index();
        let directed = |ordering: Ordering| {
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        };

        self.rows.sort_by(|a, b| {
            let (x, y) = (&a.cells[idx].value, &b.cells[idx].value);
            if column.is_numeric() {
                let x = parse_float_prefix(x).filter(|v| !v.is_nan());
                let y = parse_float_prefix(y).filter(|v| !v.is_nan());
                match (x, y) {
                    (Some(p), Some(q)) => directed(p.partial_cmp(&q).unwrap_or(Ordering::Equal)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            } else {
                directed(x.cmp(y))
            }
        });
    }
}

/// Build the detail table for the filtered rows.
pub fn detail_table(rows: &[&Row], thresholds: &Thresholds) -> DetailTable {
    let columns = SortColumn::ALL.iter().map(|c| c.title().to_string()).collect();
    let rows = rows
        .iter()
        .map(|row| DetailRow {
            line: row.line,
            cells: SortColumn::ALL
                .iter()
                .map(|column| {
                    let raw = row.get(column.field());
                    Cell {
                        value: raw.unwrap_or_default().to_string(),
                        tone: column.tone(raw, thresholds),
                    }
                })
                .collect(),
        })
        .collect();

    DetailTable { columns, rows }
}
