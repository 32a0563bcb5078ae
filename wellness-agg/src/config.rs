//! Configuration resolution for wellness-agg
//!
//! Catalog resolution priority: CLI → TOML `catalog_path` → built-in table.
//! Engine construction wires the resolved catalog, the synthesis seed and the
//! `[engine]` section together.

use crate::aggregation::{AggregationEngine, EngineOptions};
use crate::catalog::Catalog;
use crate::fetchers::{UniformSynthesis, ValueSource};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use wellness_common::config::TomlConfig;
use wellness_common::{Error, Result};

/// Resolve the source catalog
pub fn load_catalog(config: &TomlConfig, cli_override: Option<&Path>) -> Result<Catalog> {
    if let Some(path) = cli_override {
        info!("Source catalog loaded from command line: {}", path.display());
        return Catalog::load(path);
    }

    if let Some(path) = &config.catalog_path {
        info!("Source catalog loaded from TOML config: {}", path.display());
        return Catalog::load(path);
    }

    info!("Using built-in source catalog");
    Catalog::builtin()
}

/// Build the engine described by `config` over `catalog`
pub fn build_engine(config: &TomlConfig, catalog: &Catalog) -> Result<AggregationEngine> {
    let values: Arc<dyn ValueSource> =
        Arc::new(UniformSynthesis::from_seed(config.engine.synthesis_seed));
    let options = EngineOptions::from(&config.engine);

    AggregationEngine::from_catalog(catalog, values, options)
        .map_err(|e| Error::Internal(format!("Engine initialization failed: {}", e)))
}
