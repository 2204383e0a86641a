//! Report rendering: Markdown, JSON and a self-contained HTML dashboard.

pub mod charts;
pub mod generator;
pub mod html;

use crate::analysis::Dashboard;
use crate::models::ReportMetadata;
use charts::ChartSpec;
use serde::Serialize;

pub use generator::{generate_json_report, generate_markdown_report};
pub use html::generate_html_report;

/// Everything a renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
    pub charts: Vec<ChartSpec>,
    /// Cap on detail-table rows in Markdown and HTML output.
    #[serde(skip)]
    pub max_table_rows: Option<usize>,
}

impl Report {
    pub fn new(metadata: ReportMetadata, dashboard: Dashboard) -> Self {
        let charts = charts::build_charts(&dashboard);
        Self {
            metadata,
            dashboard,
            charts,
            max_table_rows: None,
        }
    }

    pub fn with_max_table_rows(mut self, limit: Option<usize>) -> Self {
        self.max_table_rows = limit;
        self
    }
}
