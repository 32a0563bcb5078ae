//! Stub fetchers for testing
//!
//! Produce fixed, verified observations without consulting a validity marker,
//! or fail/stall on demand to exercise per-source isolation.

use super::{FetchedObservations, SourceFetcher};
use crate::types::{
    Confidence, CountryId, FetchError, MetricCategory, MetricDefinition, Observation,
    ObservationKey, ValidityAssessment,
};
use async_trait::async_trait;
use std::time::Duration;

/// How a stub responds to `fetch`
#[derive(Debug, Clone, Copy)]
pub enum StubMode {
    Succeed,
    Fail,
    /// Sleep before succeeding
    Delay(Duration),
}

/// Stub fetcher with a fixed value and confidence for every metric
pub struct StubFetcher {
    source: String,
    metrics: Vec<MetricDefinition>,
    value: f64,
    confidence: Confidence,
    mode: StubMode,
}

impl StubFetcher {
    /// Stub reporting `metric_names` on a 0-10 scale
    pub fn new(source: &str, metric_names: &[&str]) -> Self {
        let metrics = metric_names
            .iter()
            .map(|name| MetricDefinition {
                name: name.to_string(),
                min: 0.0,
                max: 10.0,
                unit: "scale (0-10)".to_string(),
                label: source.to_string(),
                category: MetricCategory::Happiness,
            })
            .collect();
        Self {
            source: source.to_string(),
            metrics,
            value: 5.0,
            confidence: 0.8,
            mode: StubMode::Succeed,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn failing(mut self) -> Self {
        self.mode = StubMode::Fail;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.mode = StubMode::Delay(delay);
        self
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    fn source(&self) -> &str {
        &self.source
    }

    fn metrics(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    async fn fetch(
        &self,
        countries: &[CountryId],
        year: i32,
    ) -> Result<FetchedObservations, FetchError> {
        match self.mode {
            StubMode::Fail => {
                return Err(FetchError::Upstream(format!("{} stub failure", self.source)))
            }
            StubMode::Delay(delay) => tokio::time::sleep(delay).await,
            StubMode::Succeed => {}
        }

        let mut observations = FetchedObservations::new();
        for country in countries {
            for metric in &self.metrics {
                observations.insert(
                    ObservationKey::new(country.as_str(), metric.name.as_str()),
                    Observation {
                        metric_name: metric.name.clone(),
                        value: self.value,
                        unit: metric.unit.clone(),
                        validity: ValidityAssessment {
                            source: self.source.clone(),
                            year,
                            is_verified: true,
                            confidence: self.confidence,
                            notes: None,
                        },
                        is_real_data: false,
                    },
                );
            }
        }
        Ok(observations)
    }
}
