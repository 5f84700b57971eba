use std::path::{Path, PathBuf};

use ariteg_chunk::ChunkingStrategy;
use ariteg_types::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Default bound on concurrently running backend writes.
pub const DEFAULT_MAX_IN_FLIGHT_WRITES: usize = 64;

/// Default zstd level for compressing stores.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Errors loading or validating an [`AritegConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Pipeline configuration.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AritegConfig {
    /// Algorithm that addresses objects.
    pub primary_algorithm: HashAlgorithm,
    /// Algorithm of the integrity index's secondary hash.
    pub secondary_algorithm: HashAlgorithm,
    /// Upper bound on backend writes running at once.
    pub max_in_flight_writes: usize,
    /// Whether committed objects are zstd-compressed. Fixed when the
    /// repository is created; reading with the other setting fails
    /// verification.
    pub compress: bool,
    /// zstd level used when `compress` is set.
    pub compression_level: i32,
    /// How streams are split into chunks.
    pub chunking: ChunkingStrategy,
}

impl Default for AritegConfig {
    fn default() -> Self {
        Self {
            primary_algorithm: HashAlgorithm::Blake3,
            secondary_algorithm: HashAlgorithm::Sha2_512,
            max_in_flight_writes: DEFAULT_MAX_IN_FLIGHT_WRITES,
            compress: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            chunking: ChunkingStrategy::default(),
        }
    }
}

impl AritegConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.primary_algorithm == HashAlgorithm::Identity {
            return Err(ConfigError::Invalid(
                "identity cannot address objects".to_string(),
            ));
        }
        if self.max_in_flight_writes == 0 {
            return Err(ConfigError::Invalid(
                "max_in_flight_writes must be at least 1".to_string(),
            ));
        }
        if !(1..=22).contains(&self.compression_level) {
            return Err(ConfigError::Invalid(format!(
                "compression_level {} outside 1..=22",
                self.compression_level
            )));
        }
        Ok(())
    }
}
