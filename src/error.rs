//! Domain errors for loading datasets and building dashboards.
//!
//! Bad field values never end up here: they degrade to zero/NaN during
//! aggregation and are reported as parse issues instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("File is empty or has no header row")]
    EmptyFile,

    #[error("No CSV file selected. Pass --input or set source.default_input in .kpidash.toml")]
    NoDataset,

    #[error("Could not detect the dashboard variant from columns: {}", .0.join(", "))]
    UnknownVariant(Vec<String>),

    #[error("Customer_Satisfaction out of range on line {line}: {raw:?}")]
    SatisfactionOutOfRange { line: usize, raw: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = DashError::MissingColumns(vec!["CallDate".to_string(), "AgentID".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: CallDate, AgentID");
    }
}
