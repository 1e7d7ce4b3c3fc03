//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use regula_domain::traits::Credentials;
use regula_domain::Endpoint;
use regula_resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolution settings (TTL, read-back)
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Attempt log location
    #[serde(default)]
    pub store: StoreSettings,

    /// Registry connections
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Attempt log settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database file; defaults to the user data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// One registry connection per endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// State-level registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regional: Option<EndpointSettings>,

    /// Federal registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national: Option<EndpointSettings>,
}

/// Connection settings for a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Base URL; lookups are posted to `{base_url}/lookup`
    pub base_url: String,

    /// Bearer token sent with each lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".regula").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present, otherwise built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.resolver.validate()?;
        Ok(config)
    }

    /// Database file to open.
    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("regula").join("attempts.db"))
                .unwrap_or_else(|| PathBuf::from("regula.db"))
        })
    }

    /// Connection settings for `endpoint`, if configured.
    pub fn endpoint(&self, endpoint: Endpoint) -> Option<&EndpointSettings> {
        match endpoint {
            Endpoint::Regional => self.endpoints.regional.as_ref(),
            Endpoint::National => self.endpoints.national.as_ref(),
        }
    }
}

impl EndpointSettings {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Credentials to forward, if an API key is set.
    pub fn credentials(&self) -> Option<Credentials> {
        self.api_key.as_ref().map(Credentials::new)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_timeout_secs() -> u64 {
    30
}
