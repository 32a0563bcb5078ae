//! Source Validity Marker
//!
//! Computes a [`ValidityAssessment`] for any (source, year) pair from the
//! source's attested coverage window and base confidence.
//!
//! # Scoring
//! - `is_verified = min_year <= year <= max_year`
//! - `year_factor = (year - min_year) / (max_year - min_year)`, unclamped,
//!   so years outside the window extrapolate
//! - `confidence = clamp(base + year_factor * RECENCY_WEIGHT, 0.0, 1.0)`
//!
//! A single-year window uses a span of one year.
//!
//! The table is built once at startup and shared read-only (`Arc`).

use crate::catalog::Catalog;
use crate::error::AggregationError;
use crate::types::{Confidence, SourceId, ValidityAssessment, ValidityConfig};
use std::collections::HashMap;

/// Maximum confidence bonus for the most recent year of a window
pub const RECENCY_WEIGHT: f64 = 0.2;

/// Immutable registry of per-source trust configuration
#[derive(Debug, Clone, Default)]
pub struct ValidityMarker {
    configs: HashMap<SourceId, ValidityConfig>,
}

impl ValidityMarker {
    pub fn new<I, S>(configs: I) -> Self
    where
        I: IntoIterator<Item = (S, ValidityConfig)>,
        S: Into<SourceId>,
    {
        Self {
            configs: configs
                .into_iter()
                .map(|(source, config)| (source.into(), config))
                .collect(),
        }
    }

    /// Marker covering every source in `catalog`
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(
            catalog
                .sources()
                .iter()
                .map(|s| (s.id.clone(), s.validity)),
        )
    }

    pub fn contains(&self, source: &str) -> bool {
        self.configs.contains_key(source)
    }

    pub fn config(&self, source: &str) -> Option<&ValidityConfig> {
        self.configs.get(source)
    }

    /// Assess one observation
    ///
    /// # Errors
    /// `UnknownSource` when `source` has no configuration row.
    pub fn mark(
        &self,
        source: &str,
        year: i32,
        observed_value: f64,
    ) -> Result<ValidityAssessment, AggregationError> {
        let config = self
            .configs
            .get(source)
            .ok_or_else(|| AggregationError::UnknownSource(source.to_string()))?;

        let is_verified = (config.min_year..=config.max_year).contains(&year);
        let confidence = confidence_for(config, year);

        let notes = if is_verified {
            None
        } else {
            Some(format!(
                "{} reports {}-{}; value {:.2} for {} is outside the attested coverage window",
                source, config.min_year, config.max_year, observed_value, year
            ))
        };

        Ok(ValidityAssessment {
            source: source.to_string(),
            year,
            is_verified,
            confidence,
            notes,
        })
    }
}

/// Confidence for `year` under `config`, always within 0.0-1.0
pub fn confidence_for(config: &ValidityConfig, year: i32) -> Confidence {
    // i64 so that extreme years cannot overflow
    let span = (i64::from(config.max_year) - i64::from(config.min_year)).max(1) as f64;
    let year_factor = (i64::from(year) - i64::from(config.min_year)) as f64 / span;
    (config.confidence_threshold + year_factor * RECENCY_WEIGHT).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> ValidityMarker {
        ValidityMarker::new([
            (
                "SURVEY",
                ValidityConfig {
                    min_year: 2000,
                    max_year: 2020,
                    confidence_threshold: 0.7,
                },
            ),
            (
                "SINGLE",
                ValidityConfig {
                    min_year: 2016,
                    max_year: 2016,
                    confidence_threshold: 0.5,
                },
            ),
        ])
    }

    #[test]
    fn test_window_start_gets_base_confidence() {
        let assessment = marker().mark("SURVEY", 2000, 5.0).unwrap();
        assert!(assessment.is_verified);
        assert!((assessment.confidence - 0.7).abs() < 1e-9);
        assert!(assessment.notes.is_none());
    }

    #[test]
    fn test_window_end_gets_full_recency_bonus() {
        let assessment = marker().mark("SURVEY", 2020, 5.0).unwrap();
        assert!(assessment.is_verified);
        assert!((assessment.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_gets_half_bonus() {
        let assessment = marker().mark("SURVEY", 2010, 5.0).unwrap();
        assert!((assessment.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_future_year_is_unverified_and_capped() {
        let assessment = marker().mark("SURVEY", 2100, 5.0).unwrap();
        assert!(!assessment.is_verified);
        assert_eq!(assessment.confidence, 1.0);
        let notes = assessment.notes.expect("unverified years carry notes");
        assert!(notes.contains("2000-2020"));
        assert!(notes.contains("2100"));
    }

    #[test]
    fn test_ancient_year_is_floored_at_zero() {
        // year_factor = -50, raw confidence = 0.7 - 10.0
        let assessment = marker().mark("SURVEY", 1000, 5.0).unwrap();
        assert!(!assessment.is_verified);
        assert_eq!(assessment.confidence, 0.0);
    }

    #[test]
    fn test_single_year_window() {
        let m = marker();
        let inside = m.mark("SINGLE", 2016, 1.0).unwrap();
        assert!(inside.is_verified);
        assert!((inside.confidence - 0.5).abs() < 1e-9);

        let after = m.mark("SINGLE", 2017, 1.0).unwrap();
        assert!(!after.is_verified);
        assert!((after.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let marker = marker();

        let earliest = marker.mark("SURVEY", i32::MIN, 5.0).unwrap();
        assert!(!earliest.is_verified);
        assert_eq!(earliest.confidence, 0.0);

        let latest = marker.mark("SURVEY", i32::MAX, 5.0).unwrap();
        assert!(!latest.is_verified);
        assert_eq!(latest.confidence, 1.0);

        let wide = ValidityConfig {
            min_year: i32::MIN,
            max_year: i32::MAX,
            confidence_threshold: 0.5,
        };
        let confidence = confidence_for(&wide, 0);
        assert!((confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_source() {
        let err = marker().mark("NOPE", 2010, 1.0).unwrap_err();
        assert!(matches!(err, AggregationError::UnknownSource(ref s) if s == "NOPE"));
    }

    #[test]
    fn test_builtin_sources_stay_in_bounds_for_all_years() {
        let catalog = Catalog::builtin().unwrap();
        let marker = ValidityMarker::from_catalog(&catalog);

        for source in catalog.sources() {
            let window = source.validity;
            for year in 1900..=2100 {
                let assessment = marker.mark(&source.id, year, 0.0).unwrap();
                assert!(
                    (0.0..=1.0).contains(&assessment.confidence),
                    "{} {} -> {}",
                    source.id,
                    year,
                    assessment.confidence
                );
                assert_eq!(
                    assessment.is_verified,
                    window.min_year <= year && year <= window.max_year
                );
                assert_eq!(assessment.notes.is_some(), !assessment.is_verified);
            }
        }
    }
}
