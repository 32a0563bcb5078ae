//! Core Types for the Wellness Aggregation Engine
//!
//! Shared vocabulary for the three layers of the engine:
//! - **Catalog:** per-source metric definitions and validity windows
//! - **Fetch:** per-source observations keyed by country and metric
//! - **Merge:** per-country metric sets and the aggregation result
//!
//! JSON field names are camelCase to match the dashboard's query layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;
use wellness_common::config::MergePolicy;

// ============================================================================
// Identifiers
// ============================================================================

/// Source identifier (e.g. "WHO", "OECD", "ESS")
pub type SourceId = String;

/// Country or US state identifier (e.g. "US", "FI", "US-CA")
pub type CountryId = String;

/// Metric name (e.g. "life_satisfaction")
pub type MetricName = String;

/// Confidence score (0.0-1.0)
pub type Confidence = f64;

// ============================================================================
// Catalog Types
// ============================================================================

/// Dashboard category a metric is grouped under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Happiness,
    Healthcare,
    Education,
    WorkLifeBalance,
    SocialSupport,
    Economy,
}

/// A named, ranged, unit-labeled quantity one source can report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub name: MetricName,
    /// Inclusive lower bound
    pub min: f64,
    /// Inclusive upper bound
    pub max: f64,
    /// Unit descriptor, e.g. "scale (0-10)" or "percentage"
    pub unit: String,
    /// Display-source label shown next to the value
    pub label: String,
    pub category: MetricCategory,
}

impl MetricDefinition {
    /// Whether `value` lies inside the declared range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Force `value` into the declared range
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

/// Attested coverage window and base trust level of one source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidityConfig {
    pub min_year: i32,
    pub max_year: i32,
    /// Base confidence (0.0-1.0)
    pub confidence_threshold: Confidence,
}

// ============================================================================
// Observation Types
// ============================================================================

/// Verified/confidence judgment attached to one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityAssessment {
    pub source: SourceId,
    pub year: i32,
    /// True iff `year` lies within the source's coverage window
    pub is_verified: bool,
    /// Always within 0.0-1.0
    pub confidence: Confidence,
    /// Explanation, present only when not verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One metric value plus its validity assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub metric_name: MetricName,
    pub value: f64,
    pub unit: String,
    pub validity: ValidityAssessment,
    /// False when the value was synthesized rather than fetched upstream
    pub is_real_data: bool,
}

/// Key of one observation within a source's fetch result
///
/// Displays as `"{country}_{metric}"`. Kept structured so that identifiers
/// containing `_` can never alias each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationKey {
    pub country: CountryId,
    pub metric: MetricName,
}

impl ObservationKey {
    pub fn new(country: impl Into<CountryId>, metric: impl Into<MetricName>) -> Self {
        Self {
            country: country.into(),
            metric: metric.into(),
        }
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.country, self.metric)
    }
}

/// Fetch error for a single source
///
/// Isolated per source: the engine records it as a degraded source and
/// continues with the remaining sources.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Fetch did not complete within the configured bound
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream service error
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Validity assessment could not be produced
    #[error("Validity error: {0}")]
    Validity(String),
}

// ============================================================================
// Merge Types
// ============================================================================

/// Request shape supplied by the query layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    pub countries: Vec<CountryId>,
    pub metrics: Vec<MetricName>,
    pub year: i32,
}

/// Merged per-country bundle of observations for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryMetricSet {
    pub country: CountryId,
    pub year: i32,
    pub metrics: BTreeMap<MetricName, Observation>,
}

impl CountryMetricSet {
    pub fn new(country: impl Into<CountryId>, year: i32) -> Self {
        Self {
            country: country.into(),
            year,
            metrics: BTreeMap::new(),
        }
    }
}

/// Source whose fetch failed or timed out during one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedSource {
    pub source: SourceId,
    pub reason: String,
}

/// Several sources reported the same metric for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConflict {
    pub country: CountryId,
    pub metric: MetricName,
    /// Source whose observation was kept
    pub winner: SourceId,
    /// Sources whose observations were discarded, in registration order
    pub discarded: Vec<SourceId>,
}

/// Request metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationMetadata {
    pub request_id: Uuid,
    pub last_updated: DateTime<Utc>,
    /// Every registered source, in registration order
    pub sources: Vec<SourceId>,
    /// Number of requested countries (not countries found)
    pub total_countries: usize,
    /// Number of requested metrics (not metrics found)
    pub total_metrics: usize,
    pub degraded_sources: Vec<DegradedSource>,
    pub conflicts: Vec<MetricConflict>,
    pub merge_policy: MergePolicy,
}

/// Full response of one aggregation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub data: Vec<CountryMetricSet>,
    pub metadata: AggregationMetadata,
}

impl AggregationResult {
    /// Metric set for `country`, if it was requested
    pub fn country(&self, country: &str) -> Option<&CountryMetricSet> {
        self.data.iter().find(|set| set.country == country)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(min: f64, max: f64) -> MetricDefinition {
        MetricDefinition {
            name: "happiness".to_string(),
            min,
            max,
            unit: "scale (0-10)".to_string(),
            label: "Test".to_string(),
            category: MetricCategory::Happiness,
        }
    }

    #[test]
    fn test_observation_key_display() {
        let key = ObservationKey::new("US", "life_satisfaction");
        assert_eq!(key.to_string(), "US_life_satisfaction");
    }

    #[test]
    fn test_observation_keys_do_not_alias() {
        // Both display as "US_a_b" but stay distinct as map keys
        let first = ObservationKey::new("US", "a_b");
        let second = ObservationKey::new("US_a", "b");
        assert_eq!(first.to_string(), second.to_string());
        assert_ne!(first, second);
    }

    #[test]
    fn test_metric_definition_clamp() {
        let def = definition(0.0, 10.0);
        assert_eq!(def.clamp(11.0), 10.0);
        assert_eq!(def.clamp(-1.0), 0.0);
        assert_eq!(def.clamp(f64::NAN), 0.0);
        assert!(def.contains(def.clamp(4.2)));
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&MetricCategory::WorkLifeBalance).unwrap();
        assert_eq!(json, "\"work_life_balance\"");
    }

    #[test]
    fn test_assessment_omits_absent_notes() {
        let assessment = ValidityAssessment {
            source: "WHO".to_string(),
            year: 2020,
            is_verified: true,
            confidence: 0.9,
            notes: None,
        };
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["isVerified"], true);
        assert!(json.get("notes").is_none());
    }
}
