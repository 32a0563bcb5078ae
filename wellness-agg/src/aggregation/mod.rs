//! Aggregation Engine
//!
//! Owns the ordered registry of source fetchers and answers aggregation
//! requests in three steps:
//! 1. **Fan-out:** every registered fetcher runs concurrently, each bounded by
//!    the fetch timeout
//! 2. **Barrier:** all fetches complete before merging starts; results keep
//!    registration order regardless of completion order
//! 3. **Fan-in:** observations fold into one [`CountryMetricSet`] per country
//!    (see [`merge`])
//!
//! # Error Handling
//! - Empty countries or metrics: `InvalidRequest`, no fetch is started
//! - A failed or timed out source is excluded from the merge and listed in
//!   `metadata.degraded_sources` (per-source error isolation)
//! - Unknown countries and metrics are absence, not errors
//!
//! # Example
//! ```rust,ignore
//! let catalog = Catalog::builtin()?;
//! let engine = AggregationEngine::from_catalog(
//!     &catalog,
//!     Arc::new(UniformSynthesis::new()),
//!     EngineOptions::default(),
//! )?;
//! let result = engine.aggregate(&countries, &metrics, 2023).await?;
//! ```

pub mod merge;
pub mod status;

pub use status::{source_status, SourceStatus};

use crate::catalog::Catalog;
use crate::error::AggregationError;
use crate::fetchers::{CatalogFetcher, FetchedObservations, SourceFetcher, ValueSource};
use crate::types::{
    AggregationMetadata, AggregationRequest, AggregationResult, CountryId, DegradedSource,
    FetchError, MetricName, SourceId,
};
use crate::validity::ValidityMarker;
use futures::stream::{self, StreamExt};
use merge::SourceContribution;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wellness_common::config::{EngineConfig, MergePolicy};

/// Engine tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Upper bound for a single source fetch
    pub fetch_timeout: Duration,
    /// Maximum number of source fetches in flight per request
    pub max_concurrent_fetches: usize,
    pub merge_policy: MergePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
            merge_policy: config.merge_policy,
        }
    }
}

/// Outcome of one source fetch
struct SourceOutcome {
    source: SourceId,
    result: Result<FetchedObservations, FetchError>,
}

/// Multi-source aggregation engine
pub struct AggregationEngine {
    marker: Arc<ValidityMarker>,
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    options: EngineOptions,
}

impl AggregationEngine {
    /// Engine with an empty registry
    pub fn new(marker: Arc<ValidityMarker>, options: EngineOptions) -> Self {
        Self {
            marker,
            fetchers: Vec::new(),
            options,
        }
    }

    /// Engine with one [`CatalogFetcher`] per catalog row, in table order
    pub fn from_catalog(
        catalog: &Catalog,
        values: Arc<dyn ValueSource>,
        options: EngineOptions,
    ) -> Result<Self, AggregationError> {
        let marker = Arc::new(ValidityMarker::from_catalog(catalog));
        let mut engine = Self::new(Arc::clone(&marker), options);

        for config in catalog.sources() {
            let fetcher =
                CatalogFetcher::new(config.clone(), Arc::clone(&marker), Arc::clone(&values))?;
            engine.register_source(Arc::new(fetcher))?;
        }

        info!(
            sources = engine.source_count(),
            merge_policy = engine.options.merge_policy.as_str(),
            "Aggregation engine initialized"
        );
        Ok(engine)
    }

    /// Append `fetcher` to the registry
    ///
    /// Returns `Ok(false)` when the source is already registered; the
    /// original registration keeps its position.
    ///
    /// # Errors
    /// `UnknownSource` if the validity table has no row for the source.
    pub fn register_source(
        &mut self,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Result<bool, AggregationError> {
        let source = fetcher.source();
        if !self.marker.contains(source) {
            return Err(AggregationError::UnknownSource(source.to_string()));
        }
        if self.fetchers.iter().any(|f| f.source() == source) {
            debug!(source, "Source already registered");
            return Ok(false);
        }

        debug!(source, metrics = fetcher.metrics().len(), "Registered source");
        self.fetchers.push(fetcher);
        Ok(true)
    }

    /// Registered source ids, in registration order
    pub fn sources(&self) -> Vec<SourceId> {
        self.fetchers.iter().map(|f| f.source().to_string()).collect()
    }

    pub fn source_count(&self) -> usize {
        self.fetchers.len()
    }

    pub fn marker(&self) -> &ValidityMarker {
        &self.marker
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub async fn aggregate_request(
        &self,
        request: &AggregationRequest,
    ) -> Result<AggregationResult, AggregationError> {
        self.aggregate(&request.countries, &request.metrics, request.year)
            .await
    }

    /// Aggregate `metrics` for `countries` in `year` across every registered source
    ///
    /// Duplicate countries or metrics in the request are collapsed (first
    /// occurrence wins the position).
    ///
    /// # Errors
    /// `InvalidRequest` if `countries` or `metrics` is empty.
    pub async fn aggregate(
        &self,
        countries: &[CountryId],
        metrics: &[MetricName],
        year: i32,
    ) -> Result<AggregationResult, AggregationError> {
        if countries.is_empty() {
            return Err(AggregationError::InvalidRequest(
                "at least one country is required".to_string(),
            ));
        }
        if metrics.is_empty() {
            return Err(AggregationError::InvalidRequest(
                "at least one metric is required".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let countries = dedup(countries);
        let metrics = dedup(metrics);

        // Fan-out + barrier
        let outcomes = self.fan_out(&countries, year).await;

        let mut degraded_sources = Vec::new();
        let mut contributions = Vec::with_capacity(outcomes.len());
        for outcome in &outcomes {
            match &outcome.result {
                Ok(observations) => contributions.push(SourceContribution {
                    source: &outcome.source,
                    observations,
                }),
                Err(e) => degraded_sources.push(DegradedSource {
                    source: outcome.source.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        // Fan-in
        let policy = self.options.merge_policy;
        let (data, conflicts) = merge::merge(&contributions, &countries, &metrics, year, policy);

        if !degraded_sources.is_empty() {
            warn!(
                request_id = %request_id,
                degraded = degraded_sources.len(),
                "Aggregation completed with degraded sources"
            );
        }

        info!(
            request_id = %request_id,
            year,
            countries = countries.len(),
            metrics = metrics.len(),
            sources = self.fetchers.len(),
            conflicts = conflicts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation complete"
        );

        Ok(AggregationResult {
            data,
            metadata: AggregationMetadata {
                request_id,
                last_updated: chrono::Utc::now(),
                sources: self.sources(),
                total_countries: countries.len(),
                total_metrics: metrics.len(),
                degraded_sources,
                conflicts,
                merge_policy: policy,
            },
        })
    }

    /// Run every fetcher, at most `max_concurrent_fetches` at a time
    ///
    /// Returns once all fetches have finished, in registration order.
    async fn fan_out(&self, countries: &[CountryId], year: i32) -> Vec<SourceOutcome> {
        let timeout = self.options.fetch_timeout;
        let fetches: Vec<_> = self
            .fetchers
            .iter()
            .map(|fetcher| fetch_one(Arc::clone(fetcher), countries, year, timeout))
            .collect();

        stream::iter(fetches)
            .buffered(self.options.max_concurrent_fetches.max(1))
            .collect::<Vec<_>>()
            .await
    }
}

/// Fetch one source, bounded by `timeout`
async fn fetch_one(
    fetcher: Arc<dyn SourceFetcher>,
    countries: &[CountryId],
    year: i32,
    timeout: Duration,
) -> SourceOutcome {
    let source = fetcher.source().to_string();
    let started = Instant::now();

    let result = match tokio::time::timeout(timeout, fetcher.fetch(countries, year)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    };

    match &result {
        Ok(observations) => debug!(
            source = %source,
            observations = observations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetch successful"
        ),
        Err(e) => warn!(
            source = %source,
            error = %e,
            "Fetch failed (per-source error isolation)"
        ),
    }

    SourceOutcome { source, result }
}

/// Remove repeats, keeping first occurrences in order
fn dedup(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::mock::StubFetcher;
    use crate::types::ValidityConfig;

    fn marker(sources: &[&str]) -> Arc<ValidityMarker> {
        Arc::new(ValidityMarker::new(sources.iter().map(|s| {
            (
                s.to_string(),
                ValidityConfig {
                    min_year: 2000,
                    max_year: 2030,
                    confidence_threshold: 0.8,
                },
            )
        })))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_register_unknown_source_rejected() {
        let mut engine = AggregationEngine::new(marker(&["A"]), EngineOptions::default());
        let result = engine.register_source(Arc::new(StubFetcher::new("B", &["happiness"])));
        assert!(matches!(result, Err(AggregationError::UnknownSource(ref s)) if s == "B"));
        assert_eq!(engine.source_count(), 0);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut engine = AggregationEngine::new(marker(&["A", "B"]), EngineOptions::default());
        assert!(engine
            .register_source(Arc::new(StubFetcher::new("A", &["happiness"])))
            .unwrap());
        assert!(engine
            .register_source(Arc::new(StubFetcher::new("B", &["happiness"])))
            .unwrap());
        assert!(!engine
            .register_source(Arc::new(StubFetcher::new("A", &["education"])))
            .unwrap());
        assert_eq!(engine.sources(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected() {
        let engine = AggregationEngine::new(marker(&[]), EngineOptions::default());

        let no_countries = engine.aggregate(&[], &strings(&["happiness"]), 2023).await;
        assert!(matches!(no_countries, Err(AggregationError::InvalidRequest(_))));

        let no_metrics = engine.aggregate(&strings(&["US"]), &[], 2023).await;
        assert!(matches!(no_metrics, Err(AggregationError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_request_entries_collapse() {
        let mut engine = AggregationEngine::new(marker(&["A"]), EngineOptions::default());
        engine
            .register_source(Arc::new(StubFetcher::new("A", &["happiness"])))
            .unwrap();

        let result = engine
            .aggregate(
                &strings(&["US", "FI", "US"]),
                &strings(&["happiness", "happiness"]),
                2023,
            )
            .await
            .unwrap();

        assert_eq!(result.metadata.total_countries, 2);
        assert_eq!(result.metadata.total_metrics, 1);
        let order: Vec<_> = result.data.iter().map(|s| s.country.as_str()).collect();
        assert_eq!(order, vec!["US", "FI"]);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_visits_every_source() {
        let options = EngineOptions {
            max_concurrent_fetches: 1,
            ..EngineOptions::default()
        };
        let mut engine = AggregationEngine::new(marker(&["A", "B", "C"]), options);
        for source in ["A", "B", "C"] {
            engine
                .register_source(Arc::new(StubFetcher::new(source, &[source])))
                .unwrap();
        }

        let result = engine
            .aggregate(&strings(&["US"]), &strings(&["A", "B", "C"]), 2023)
            .await
            .unwrap();
        assert_eq!(result.data[0].metrics.len(), 3);
    }

    #[test]
    fn test_options_from_engine_config() {
        let config = EngineConfig {
            fetch_timeout_ms: 250,
            max_concurrent_fetches: 0,
            merge_policy: MergePolicy::HighestConfidence,
            synthesis_seed: None,
        };
        let options = EngineOptions::from(&config);
        assert_eq!(options.fetch_timeout, Duration::from_millis(250));
        assert_eq!(options.max_concurrent_fetches, 1);
        assert_eq!(options.merge_policy, MergePolicy::HighestConfidence);
    }
}
