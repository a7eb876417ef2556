use crate::project::ProjectFile;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse TOML project file '{path}': {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON project file '{path}': {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse JSON5 project file '{path}': {message}")]
    ParseJson5 { path: String, message: String },
    #[error("Unsupported project file format '{0}'. Use .json, .json5 or .toml")]
    UnsupportedFormat(String),
}

/// Tunables of the match cache and of large-document handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub large_file: LargeFileConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Per-filter entry capacity.
    pub max_entries: usize,
    /// Entry lifetime. Entries captured in degraded mode live half as long.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 16,
            ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> TimeDelta {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LargeFileConfig {
    /// Documents bigger than this many bytes are analysed in degraded mode.
    pub threshold_bytes: usize,
    /// Cap on stored decoration ranges for degraded documents.
    pub max_decoration_ranges: usize,
    /// Degraded documents are not decorated once a filter's live match
    /// count reaches this value.
    pub decoration_match_ceiling: usize,
}

impl Default for LargeFileConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: 5 * 1024 * 1024,
            max_decoration_ranges: 5_000,
            decoration_match_ceiling: 10_000,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = read_file(path)?;

    toml::from_str::<EngineConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static EngineConfig {
    static DEFAULT_CONFIG: LazyLock<EngineConfig> = LazyLock::new(EngineConfig::default);
    &DEFAULT_CONFIG
}

/// Load persisted project definitions, picking the format from the extension
pub fn load_project_file(path: &Path) -> Result<ProjectFile, ConfigError> {
    let path_display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => {
            let raw = read_file(path)?;
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseJson {
                path: path_display,
                source,
            })
        }
        "json5" => {
            let raw = read_file(path)?;
            json5::from_str(&raw).map_err(|e| ConfigError::ParseJson5 {
                path: path_display,
                message: e.to_string(),
            })
        }
        "toml" => {
            let raw = read_file(path)?;
            toml::from_str(&raw).map_err(|source| ConfigError::ParseToml {
                path: path_display,
                source,
            })
        }
        _ => Err(ConfigError::UnsupportedFormat(path_display)),
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}
