//! Configuration for scale-down runs.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (SCALEDOWN_ prefix, `__` separator)
//! 2. Config file (scaledown.toml)
//! 3. Defaults

use serde::Deserialize;

pub use ::config::{Config, ConfigError};

/// Sampling defaults, read from the `[scale_down]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScaleDownConfig {
    /// Page size for node and edge extraction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Algorithm used when a request does not name one.
    #[serde(default = "default_algorithm")]
    pub default_algorithm: String,

    /// Fixed RNG seed for reproducible samples.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Node count of discovered motifs.
    #[serde(default = "default_motif_size")]
    pub motif_size: usize,

    /// Maximum number of motifs to return.
    #[serde(default = "default_max_motifs")]
    pub max_motifs: usize,
}

fn default_batch_size() -> usize {
    5000
}

fn default_algorithm() -> String {
    "forest_fire".to_string()
}

fn default_motif_size() -> usize {
    3
}

fn default_max_motifs() -> usize {
    10
}

impl Default for ScaleDownConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            default_algorithm: default_algorithm(),
            seed: None,
            motif_size: default_motif_size(),
            max_motifs: default_max_motifs(),
        }
    }
}

/// Build the layered config source for a file prefix (e.g. `scaledown`).
pub fn layered(file_prefix: &str) -> Result<config::Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("SCALEDOWN")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

/// Read the `[scale_down]` section. Defaults apply only when the section is
/// absent; a section that fails to deserialize is an error.
pub fn scale_down_section(cfg: &Config) -> Result<ScaleDownConfig, ConfigError> {
    match cfg.get::<ScaleDownConfig>("scale_down") {
        Ok(c) => Ok(c),
        Err(ConfigError::NotFound(key)) => {
            tracing::debug!(%key, "No [scale_down] section, using defaults");
            Ok(ScaleDownConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Load the `[scale_down]` section from the layered sources.
pub fn load_scale_down_config(file_prefix: &str) -> Result<ScaleDownConfig, ConfigError> {
    scale_down_section(&layered(file_prefix)?)
}
