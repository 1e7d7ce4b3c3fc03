//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid resolver settings
    #[error("Configuration error: {0}")]
    Resolver(#[from] regula_resolver::ConfigError),

    /// Resolution failed
    #[error(transparent)]
    Resolve(#[from] regula_resolver::ResolveError),

    /// Attempt log could not be opened or read
    #[error("Store error: {0}")]
    Store(#[from] regula_store::StoreError),

    /// Registry client could not be built
    #[error("Provider error: {0}")]
    Provider(#[from] regula_provider::ProviderError),

    /// Malformed identifier
    #[error("Invalid input: {}", .0.reason)]
    InvalidQuery(#[from] regula_domain::InvalidQuery),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
