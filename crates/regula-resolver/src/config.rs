//! Configuration for resolution
//!
//! Defines the default cache TTL and the bounded read-back policy.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Resolver configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Configuration for the resolver
///
/// # Examples
///
/// ```
/// use regula_resolver::ResolverConfig;
///
/// let config = ResolverConfig::default();
/// assert_eq!(config.ttl_days, 30);
///
/// // Caching disabled: every resolution calls the registry
/// let config = ResolverConfig::uncached();
/// assert_eq!(config.ttl_days, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum age, in days, of a successful attempt served from cache
    /// Default: 30. Zero disables caching.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Wait before each read-back of a freshly written attempt (milliseconds)
    /// Default: 1500
    #[serde(default = "default_readback_delay_ms")]
    pub readback_delay_ms: u64,

    /// Number of read-back rounds before giving up on the log id
    /// Default: 1
    #[serde(default = "default_readback_attempts")]
    pub readback_attempts: u32,

    /// Maximum attempts read per query
    /// Default: 50
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_ttl_days() -> u32 {
    30
}

fn default_readback_delay_ms() -> u64 {
    1500
}

fn default_readback_attempts() -> u32 {
    1
}

fn default_history_limit() -> usize {
    50
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            readback_delay_ms: default_readback_delay_ms(),
            readback_attempts: default_readback_attempts(),
            history_limit: default_history_limit(),
        }
    }
}

impl ResolverConfig {
    /// Caching disabled; every resolution goes to the registry
    pub fn uncached() -> Self {
        Self {
            ttl_days: 0,
            ..Self::default()
        }
    }

    /// Slower writers: three read-back rounds, one second apart
    pub fn patient_readback() -> Self {
        Self {
            readback_delay_ms: 1000,
            readback_attempts: 3,
            ..Self::default()
        }
    }

    /// Parse from a TOML document and validate
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readback_attempts == 0 {
            return Err(ConfigError::Invalid("readback_attempts must be at least 1".to_string()));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Read-back delay as Duration
    pub fn readback_delay(&self) -> Duration {
        Duration::from_millis(self.readback_delay_ms)
    }
}
