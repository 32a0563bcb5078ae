//! Configuration loading and config file resolution
//!
//! Config file path resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`WELLNESS_CONFIG`)
//! 3. Per-user config file (`~/.config/wellness/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts with compiled defaults. A config file that exists but does not
//! parse is a [`Error::Config`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "WELLNESS_CONFIG";

/// Compiled-in defaults used when no config file overrides them
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub log_level: String,
    pub bind: String,
    pub fetch_timeout_ms: u64,
    pub max_concurrent_fetches: usize,
    pub year: i32,
    pub countries: Vec<String>,
}

impl CompiledDefaults {
    pub fn get() -> Self {
        Self {
            log_level: "info".to_string(),
            bind: "127.0.0.1:5740".to_string(),
            fetch_timeout_ms: 2_000,
            max_concurrent_fetches: 8,
            year: 2023,
            countries: ["US", "FI", "DK", "JP", "BR", "CA"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Policy applied when several sources report the same metric for a country
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The source registered last overwrites earlier ones
    #[default]
    LastRegisteredWins,
    /// The observation with the highest confidence wins; ties go to the later source
    HighestConfidence,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::LastRegisteredWins => "last_registered_wins",
            MergePolicy::HighestConfidence => "highest_confidence",
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: CompiledDefaults::get().log_level,
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:5740`
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: CompiledDefaults::get().bind,
        }
    }
}

/// `[engine]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for a single source fetch, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Maximum number of source fetches in flight per request
    pub max_concurrent_fetches: usize,
    pub merge_policy: MergePolicy,
    /// Seed for value synthesis; unseeded when absent
    pub synthesis_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::get();
        Self {
            fetch_timeout_ms: defaults.fetch_timeout_ms,
            max_concurrent_fetches: defaults.max_concurrent_fetches,
            merge_policy: MergePolicy::default(),
            synthesis_seed: None,
        }
    }
}

/// `[defaults]` section: request defaults for the admin status view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub year: i32,
    pub countries: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::get();
        Self {
            year: defaults.year,
            countries: defaults.countries,
        }
    }
}

/// Service configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Optional source catalog replacing the built-in table
    pub catalog_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub defaults: DefaultsConfig,
}

impl TomlConfig {
    /// Parse a config document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "engine.max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if self.engine.fetch_timeout_ms == 0 {
            return Err(Error::Config(
                "engine.fetch_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves and loads the config file for one service
pub struct ConfigResolver {
    module_name: String,
}

impl ConfigResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Locate the config file to use, if any
    ///
    /// An explicit path (CLI or environment) is returned even when it does not
    /// exist so that [`ConfigResolver::load`] can report it.
    pub fn resolve_path(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config file
        dirs::config_dir()
            .map(|d| d.join("wellness").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Load the resolved config, falling back to compiled defaults
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        match self.resolve_path(cli_arg) {
            Some(path) if path.exists() => {
                let config = TomlConfig::load(&path)?;
                info!(module = %self.module_name, path = %path.display(), "Loaded config file");
                Ok(config)
            }
            Some(path) => {
                warn!(
                    module = %self.module_name,
                    path = %path.display(),
                    "Config file not found, using compiled defaults"
                );
                Ok(TomlConfig::default())
            }
            None => {
                info!(module = %self.module_name, "No config file, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}
