//! Configuration for the stub engine, loaded from TOML.

use crate::error::StubError;
use crate::error::StubResult;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Main stub engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StubEngineConfig {
    /// Upper bound for the in-memory stub cache, in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity_bytes: usize,

    /// Source files larger than this are not indexed
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Persistent stub store
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for StubEngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity_bytes: default_cache_capacity(),
            max_file_size: default_max_file_size(),
            storage: StorageConfig::default(),
        }
    }
}

/// Persistent store configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory for stored stub streams; no persistence when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// zstd level for stored streams (1..=22)
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            compression_level: default_compression_level(),
        }
    }
}

const fn default_cache_capacity() -> usize {
    64 * 1024 * 1024
}

const fn default_max_file_size() -> usize {
    stubindex_ast::language_registry::DEFAULT_MAX_FILE_SIZE
}

const fn default_compression_level() -> i32 {
    3
}

impl StubEngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> StubResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StubError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> StubResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> StubResult<String> {
        toml::to_string(self).map_err(|e| StubError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> StubResult<()> {
        if self.cache_capacity_bytes == 0 {
            return Err(StubError::InvalidConfig(
                "cache_capacity_bytes must be positive".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(StubError::InvalidConfig(
                "max_file_size must be positive".to_string(),
            ));
        }
        if !(1..=22).contains(&self.storage.compression_level) {
            return Err(StubError::InvalidConfig(format!(
                "storage.compression_level {} is outside 1..=22",
                self.storage.compression_level
            )));
        }
        Ok(())
    }
}
