//! Collector configuration structs and TOML loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::processing::AnalysisSettings;
use crate::types::Axis;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "VIBRASCOPE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "vibrascope.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

/// Top-level configuration.
///
/// Loading order:
/// 1. `$VIBRASCOPE_CONFIG`
/// 2. `./vibrascope.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VibrascopeConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Listener addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Producers connect here
    pub ingest_addr: String,
    /// Window fetchers connect here
    pub feed_addr: String,
    /// HTTP API
    pub http_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ingest_addr: defaults::INGEST_ADDR.to_string(),
            feed_addr: defaults::FEED_ADDR.to_string(),
            http_addr: defaults::HTTP_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Most recent samples retained
    pub capacity: usize,
    /// Buffered samples replayed to a new feed subscriber
    pub feed_backlog: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::WINDOW_CAPACITY,
            feed_backlog: defaults::FEED_BACKLOG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sensor sampling rate (Hz)
    pub sampling_rate: f64,
    /// Wavelet family name (haar, db1-db4, sym4)
    pub wavelet: String,
    /// DWT decomposition depth
    pub levels: usize,
    /// Axis analyzed by default
    pub axis: Axis,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_rate: defaults::SAMPLING_RATE_HZ,
            wavelet: defaults::WAVELET.to_string(),
            levels: defaults::DECOMPOSITION_LEVELS,
            axis: Axis::X,
        }
    }
}

impl AnalysisConfig {
    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            sampling_rate: self.sampling_rate,
            wavelet: self.wavelet.clone(),
            levels: self.levels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Feed endpoint (HOST:PORT)
    pub endpoint: String,
    /// Samples per window
    pub target_count: usize,
    /// Whole-fetch deadline (ms)
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::FETCH_ENDPOINT.to_string(),
            target_count: defaults::TARGET_COUNT,
            timeout_ms: defaults::FETCH_TIMEOUT_MS,
        }
    }
}

impl VibrascopeConfig {
    /// Load configuration using the standard search order.
    ///
    /// Never fails: an unreadable or invalid file is logged and the next
    /// source is tried.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))
    }
}
