//! Per-source status for the admin view
//!
//! Coverage is derived from a merged result: the share of returned countries
//! holding at least one observation attributed to the source. A source that
//! loses every collision therefore shows zero coverage.

use crate::catalog::Catalog;
use crate::types::{AggregationResult, MetricCategory, MetricName, SourceId};
use serde::Serialize;

/// Admin status of one registered source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub source: SourceId,
    pub display_name: String,
    pub categories: Vec<MetricCategory>,
    pub metrics: Vec<MetricName>,
    /// countries with this source / total countries (0.0-1.0)
    pub coverage: f64,
    /// Fetch failed or timed out for this request
    pub degraded: bool,
}

/// Status of every source listed in `result.metadata.sources`
pub fn source_status(result: &AggregationResult, catalog: &Catalog) -> Vec<SourceStatus> {
    let total_countries = result.data.len();

    result
        .metadata
        .sources
        .iter()
        .map(|source| {
            let covered = result
                .data
                .iter()
                .filter(|set| {
                    set.metrics
                        .values()
                        .any(|observation| &observation.validity.source == source)
                })
                .count();
            let coverage = if total_countries == 0 {
                0.0
            } else {
                covered as f64 / total_countries as f64
            };

            let (display_name, categories, metrics) = match catalog.source(source) {
                Some(config) => (
                    config.display_name.clone(),
                    config.categories(),
                    config.metrics.iter().map(|m| m.name.clone()).collect(),
                ),
                None => (source.clone(), Vec::new(), Vec::new()),
            };

            SourceStatus {
                source: source.clone(),
                display_name,
                categories,
                metrics,
                coverage,
                degraded: result
                    .metadata
                    .degraded_sources
                    .iter()
                    .any(|d| &d.source == source),
            }
        })
        .collect()
}
