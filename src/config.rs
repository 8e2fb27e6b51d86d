//! Configuration management for the validation engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (fastschema.toml)
//! - Environment variables (FASTSCHEMA__*)
//!
//! ## Example config file (fastschema.toml):
//! ```toml
//! [batch]
//! max_concurrency = 5
//! stop_on_first_error = false
//! timeout_ms = 10000
//!
//! [compiler]
//! enabled = true
//! unroll_threshold = 8
//! batch_size = 64
//!
//! [accelerator]
//! enabled = true
//! verify_results = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for an [`Engine`](crate::Engine) and its batch runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Batch runtime defaults
    #[serde(default)]
    pub batch: BatchConfig,

    /// Compiled validator settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Accelerator delegation settings
    #[serde(default)]
    pub accelerator: AcceleratorConfig,
}

/// Batch runtime defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum items running at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Stop admitting items after the first failure
    #[serde(default)]
    pub stop_on_first_error: bool,

    /// Wall-clock budget for a whole batch
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Compiled validator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Use compiled validators for synchronous engine calls
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Arrays up to this length are walked directly
    #[serde(default = "default_unroll_threshold")]
    pub unroll_threshold: usize,

    /// Chunk size for longer arrays
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Accelerator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorConfig {
    /// Delegate to a registered accelerator when it supports the schema
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Re-run every accelerated call on the compiled path and compare
    #[serde(default)]
    pub verify_results: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    5
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_unroll_threshold() -> usize {
    8
}

fn default_batch_size() -> usize {
    64
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            stop_on_first_error: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            unroll_threshold: default_unroll_threshold(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verify_results: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["fastschema.toml", ".fastschema.toml", "config/fastschema.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "fastschema") {
            let xdg_config = config_dir.config_dir().join("fastschema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // FASTSCHEMA__BATCH__MAX_CONCURRENCY=8
        builder = builder.add_source(
            Environment::with_prefix("FASTSCHEMA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
