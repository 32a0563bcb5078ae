//! Source Catalog
//!
//! Static table of every data source: its display name, validity window and
//! the metrics it offers. One table row per source replaces per-source code;
//! adding a source means appending a `[[sources]]` row.
//!
//! The built-in table is embedded from `data/sources.toml`. Operators may
//! replace it with their own file (see [`crate::config::load_catalog`]).

use crate::types::{MetricCategory, MetricDefinition, MetricName, SourceId, ValidityConfig};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use wellness_common::{Error, Result};

const BUILTIN_CATALOG: &str = include_str!("../data/sources.toml");

/// One source: identity, trust configuration and metric catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub id: SourceId,
    pub display_name: String,
    pub validity: ValidityConfig,
    /// Metric definitions in table order
    pub metrics: Vec<MetricDefinition>,
}

impl SourceConfig {
    pub fn metric(&self, name: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Distinct categories in table order
    pub fn categories(&self) -> Vec<MetricCategory> {
        let mut categories = Vec::new();
        for metric in &self.metrics {
            if !categories.contains(&metric.category) {
                categories.push(metric.category);
            }
        }
        categories
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    sources: Vec<SourceRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceRow {
    id: String,
    display_name: String,
    validity: ValidityConfig,
    metrics: Vec<MetricRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricRow {
    name: String,
    min: f64,
    max: f64,
    unit: String,
    category: MetricCategory,
    label: Option<String>,
}

/// Validated, immutable source table
#[derive(Debug, Clone)]
pub struct Catalog {
    sources: Vec<SourceConfig>,
}

impl Catalog {
    /// The shipped table of sources
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse catalog failed: {}", e)))?;

        let sources = file
            .sources
            .into_iter()
            .map(|row| {
                let display_name = row.display_name;
                let metrics = row
                    .metrics
                    .into_iter()
                    .map(|m| MetricDefinition {
                        name: m.name,
                        min: m.min,
                        max: m.max,
                        unit: m.unit,
                        label: m.label.unwrap_or_else(|| display_name.clone()),
                        category: m.category,
                    })
                    .collect();
                SourceConfig {
                    id: row.id,
                    display_name,
                    validity: row.validity,
                    metrics,
                }
            })
            .collect();

        Self::from_sources(sources)
    }

    /// Read, parse and validate a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build a catalog from already constructed rows
    pub fn from_sources(sources: Vec<SourceConfig>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::Config("Catalog defines no sources".to_string()));
        }

        let mut seen_ids = HashSet::new();
        for source in &sources {
            if !seen_ids.insert(source.id.as_str()) {
                return Err(Error::Config(format!("Duplicate source id: {}", source.id)));
            }
            validate_source(source)?;
        }

        debug!(sources = sources.len(), "Catalog validated");
        Ok(Self { sources })
    }

    /// All sources in table order
    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Union of metric names across all sources, in first-seen order
    pub fn metric_names(&self) -> Vec<MetricName> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .flat_map(|s| s.metrics.iter())
            .filter(|m| seen.insert(m.name.as_str()))
            .map(|m| m.name.clone())
            .collect()
    }

    /// Sources defining `metric`, in table order
    pub fn sources_defining(&self, metric: &str) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.metric(metric).is_some())
            .map(|s| s.id.as_str())
            .collect()
    }
}

fn validate_source(source: &SourceConfig) -> Result<()> {
    if source.id.trim().is_empty() {
        return Err(Error::Config("Source id must not be empty".to_string()));
    }

    let validity = &source.validity;
    if validity.min_year > validity.max_year {
        return Err(Error::Config(format!(
            "Source {}: min_year {} is after max_year {}",
            source.id, validity.min_year, validity.max_year
        )));
    }
    if !(0.0..=1.0).contains(&validity.confidence_threshold) {
        return Err(Error::Config(format!(
            "Source {}: confidence_threshold {} outside 0.0-1.0",
            source.id, validity.confidence_threshold
        )));
    }

    if source.metrics.is_empty() {
        return Err(Error::Config(format!("Source {} defines no metrics", source.id)));
    }

    let mut seen_metrics = HashSet::new();
    for metric in &source.metrics {
        if !seen_metrics.insert(metric.name.as_str()) {
            return Err(Error::Config(format!(
                "Source {}: duplicate metric {}",
                source.id, metric.name
            )));
        }
        if !metric.min.is_finite() || !metric.max.is_finite() || metric.min > metric.max {
            return Err(Error::Config(format!(
                "Source {}: metric {} has invalid range [{}, {}]",
                source.id, metric.name, metric.min, metric.max
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SOURCES: &str = r#"
[[sources]]
id = "A"
display_name = "Source A"
validity = { min_year = 2000, max_year = 2020, confidence_threshold = 0.8 }
metrics = [
  { name = "happiness", min = 0.0, max = 10.0, unit = "scale (0-10)", category = "happiness" },
  { name = "education", min = 0.0, max = 100.0, unit = "percentage", category = "education", label = "A literacy" },
]

[[sources]]
id = "B"
display_name = "Source B"
validity = { min_year = 2010, max_year = 2010, confidence_threshold = 0.5 }
metrics = [
  { name = "happiness", min = 1.0, max = 4.0, unit = "scale (1-4)", category = "happiness" },
]
"#;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= 30, "expected ~30 sources, got {}", catalog.len());
        assert!(catalog.source("WHO").is_some());
        assert!(catalog.source("OECD").is_some());
        // Collisions are part of the shipped table
        assert!(catalog.sources_defining("happiness").len() > 10);
    }

    #[test]
    fn test_label_defaults_to_display_name() {
        let catalog = Catalog::from_toml_str(TWO_SOURCES).unwrap();
        let a = catalog.source("A").unwrap();
        assert_eq!(a.metric("happiness").unwrap().label, "Source A");
        assert_eq!(a.metric("education").unwrap().label, "A literacy");
    }

    #[test]
    fn test_metric_names_union_in_first_seen_order() {
        let catalog = Catalog::from_toml_str(TWO_SOURCES).unwrap();
        assert_eq!(catalog.metric_names(), vec!["happiness", "education"]);
        assert_eq!(catalog.sources_defining("happiness"), vec!["A", "B"]);
        assert!(catalog.sources_defining("nonexistent_metric").is_empty());
    }

    #[test]
    fn test_categories_are_distinct() {
        let catalog = Catalog::builtin().unwrap();
        let oecd = catalog.source("OECD").unwrap();
        let categories = oecd.categories();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0], MetricCategory::Happiness);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let doc = format!("{}\n{}", TWO_SOURCES, TWO_SOURCES);
        let err = Catalog::from_toml_str(&doc).unwrap_err();
        assert!(err.to_string().contains("Duplicate source id"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let doc = r#"
[[sources]]
id = "X"
display_name = "X"
validity = { min_year = 2000, max_year = 2020, confidence_threshold = 0.8 }
metrics = [{ name = "happiness", min = 10.0, max = 0.0, unit = "scale", category = "happiness" }]
"#;
        assert!(matches!(Catalog::from_toml_str(doc), Err(Error::Config(_))));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let doc = r#"
[[sources]]
id = "X"
display_name = "X"
validity = { min_year = 2020, max_year = 2000, confidence_threshold = 0.8 }
metrics = [{ name = "happiness", min = 0.0, max = 10.0, unit = "scale", category = "happiness" }]
"#;
        assert!(matches!(Catalog::from_toml_str(doc), Err(Error::Config(_))));
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let doc = r#"
[[sources]]
id = "X"
display_name = "X"
validity = { min_year = 2000, max_year = 2020, confidence_threshold = 1.5 }
metrics = [{ name = "happiness", min = 0.0, max = 10.0, unit = "scale", category = "happiness" }]
"#;
        assert!(matches!(Catalog::from_toml_str(doc), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(Catalog::from_toml_str("").is_err());
    }

    #[test]
    fn test_unknown_validity_key_rejected() {
        let doc = r#"
[[sources]]
id = "X"
display_name = "X"
validity = { min_year = 2000, max_year = 2020, confidence_treshold = 0.8 }
metrics = [{ name = "happiness", min = 0.0, max = 10.0, unit = "scale", category = "happiness" }]
"#;
        assert!(matches!(Catalog::from_toml_str(doc), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let doc = r#"
[[sources]]
id = "X"
display_name = "X"
validity = { min_year = 2000, max_year = 2020, confidence_threshold = 0.8 }
metrics = [{ name = "happiness", min = 0.0, max = 10.0, unit = "scale", category = "vibes" }]
"#;
        assert!(Catalog::from_toml_str(doc).is_err());
    }
}
