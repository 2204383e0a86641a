//! Application state: the loaded dataset and the active filters.

use crate::analysis::{build_dashboard, Dashboard, DashboardOptions};
use crate::error::DashError;
use crate::models::{Dataset, FilterState, Variant};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Owns the current dataset snapshot and the filter state.
///
/// Every call to [`Session::dashboard`] recomputes all panels from the
/// snapshot; nothing is cached between calls.
#[derive(Debug, Default)]
pub struct Session {
    dataset: Option<Dataset>,
    variant: Option<Variant>,
    filters: FilterState,
    options: DashboardOptions,
}

impl Session {
    pub fn new(filters: FilterState, options: DashboardOptions) -> Self {
        Self {
            dataset: None,
            variant: None,
            filters,
            options,
        }
    }

    /// Replace the dataset wholesale. Returns the previous one, if any.
    ///
    /// `variant` overrides header detection when given.
    pub fn load(&mut self, dataset: Dataset, variant: Option<Variant>) -> Option<Dataset> {
        let variant = variant.or_else(|| dataset.detect_variant());
        info!(
            "Session loaded {} rows from {} ({})",
            dataset.len(),
            dataset.source,
            variant.map_or_else(|| "unknown variant".to_string(), |v| v.to_string())
        );
        self.variant = variant;
        self.dataset.replace(dataset)
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        debug!("Filters set to [{}]", filters.describe());
        self.filters = filters;
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn variant(&self) -> Option<Variant> {
        self.variant
    }

    /// Compute the dashboard for the current snapshot and filters.
    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard, DashError> {
        let dataset = self.dataset.as_ref().ok_or(DashError::NoDataset)?;
        let variant = self
            .variant
            .ok_or_else(|| DashError::UnknownVariant(dataset.headers.clone()))?;
        build_dashboard(dataset, variant, &self.filters, &self.options, now)
    }
}
