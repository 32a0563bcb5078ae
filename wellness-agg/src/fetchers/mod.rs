//! Source Fetchers
//!
//! One fetcher per registered source. Every fetcher implements
//! [`SourceFetcher`] so the aggregation engine can drive them uniformly.
//!
//! # Fetchers
//! - **catalog_fetcher** - Generic, table-driven fetcher used for every catalog row
//! - **mock** - Stub fetchers with fixed values, failures or delays (tests and
//!   the `test-util` feature only)
//!
//! # Value production
//! [`synthesis::ValueSource`] is where a value comes from. The shipped
//! implementations synthesize values; a network-backed implementation slots in
//! there without changing the fetcher.

pub mod catalog_fetcher;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod synthesis;

pub use catalog_fetcher::CatalogFetcher;
pub use synthesis::{MidpointSynthesis, UniformSynthesis, ValueSource};

use crate::types::{CountryId, FetchError, MetricDefinition, Observation, ObservationKey};
use std::collections::HashMap;

/// Observations produced by one source for one request
pub type FetchedObservations = HashMap<ObservationKey, Observation>;

/// Source fetcher trait
///
/// # Example
/// ```rust,ignore
/// let fetcher = CatalogFetcher::new(config, marker, synthesis)?;
/// let observations = fetcher.fetch(&["US".to_string()], 2023).await?;
/// let happiness = &observations[&ObservationKey::new("US", "happiness")];
/// ```
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Source identifier for provenance tracking
    fn source(&self) -> &str;

    /// Metrics this source can report
    fn metrics(&self) -> &[MetricDefinition];

    /// Produce one observation per country and catalog metric
    ///
    /// Keys are unique by construction (`{country}_{metric}`).
    ///
    /// # Errors
    /// Returns `FetchError` if the source cannot be read. The engine isolates
    /// the failure to this source.
    async fn fetch(
        &self,
        countries: &[CountryId],
        year: i32,
    ) -> Result<FetchedObservations, FetchError>;
}
