//! Catalog-driven Source Fetcher
//!
//! Single generic fetcher parameterized by one catalog row. For every country
//! and every metric of the row it obtains a value from its [`ValueSource`],
//! clamps it into the declared range and attaches a validity assessment.

use super::{FetchedObservations, SourceFetcher, ValueSource};
use crate::catalog::SourceConfig;
use crate::error::AggregationError;
use crate::types::{CountryId, FetchError, MetricDefinition, Observation, ObservationKey};
use crate::validity::ValidityMarker;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Fetcher for one catalog row
pub struct CatalogFetcher {
    config: SourceConfig,
    marker: Arc<ValidityMarker>,
    values: Arc<dyn ValueSource>,
}

impl CatalogFetcher {
    /// # Errors
    /// `UnknownSource` if `marker` has no validity row for `config.id`.
    pub fn new(
        config: SourceConfig,
        marker: Arc<ValidityMarker>,
        values: Arc<dyn ValueSource>,
    ) -> Result<Self, AggregationError> {
        if !marker.contains(&config.id) {
            return Err(AggregationError::UnknownSource(config.id));
        }
        Ok(Self {
            config,
            marker,
            values,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

#[async_trait]
impl SourceFetcher for CatalogFetcher {
    fn source(&self) -> &str {
        &self.config.id
    }

    fn metrics(&self) -> &[MetricDefinition] {
        &self.config.metrics
    }

    async fn fetch(
        &self,
        countries: &[CountryId],
        year: i32,
    ) -> Result<FetchedObservations, FetchError> {
        let mut observations =
            HashMap::with_capacity(countries.len() * self.config.metrics.len());
        let is_real_data = self.values.is_real_data();

        for country in countries {
            for metric in &self.config.metrics {
                let raw = self.values.sample(country, year, metric).await?;
                let value = metric.clamp(raw);
                let validity = self
                    .marker
                    .mark(&self.config.id, year, value)
                    .map_err(|e| FetchError::Validity(e.to_string()))?;

                observations.insert(
                    ObservationKey::new(country.as_str(), metric.name.as_str()),
                    Observation {
                        metric_name: metric.name.clone(),
                        value,
                        unit: metric.unit.clone(),
                        validity,
                        is_real_data,
                    },
                );
            }
        }

        trace!(
            source = %self.config.id,
            year,
            observations = observations.len(),
            "Catalog fetch complete"
        );
        Ok(observations)
    }
}
