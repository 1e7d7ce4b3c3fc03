//! Error types for resolution

use chrono::{DateTime, Utc};
use regula_domain::{AttemptId, Endpoint, ErrorClass, InvalidQuery};
use thiserror::Error;

/// Reasons a resolution did not produce vehicle data
///
/// Only [`ResolveError::ProviderFailure`] means a registry was actually
/// called. Nothing here is retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Malformed input; fixable by the caller
    #[error("Invalid query: {}", .0.reason)]
    InvalidQuery(#[from] InvalidQuery),

    /// The same query already failed on this endpoint; the failure is replayed
    #[error("Lookup already failed on {endpoint} at {failed_at}: {message}")]
    RepeatedFailure {
        /// Endpoint the failure was recorded on
        endpoint: Endpoint,
        /// Classification of the original failure
        error_class: ErrorClass,
        /// Message for the user (rewritten for not-found failures)
        message: String,
        /// Registry text from the original failure
        original_message: String,
        /// When the original failure was recorded
        failed_at: DateTime<Utc>,
        /// Log entry being replayed
        attempt_log_id: AttemptId,
    },

    /// History says the vehicle belongs to the other endpoint
    #[error("{message}")]
    WrongEndpoint {
        /// Endpoint the caller asked for
        requested: Endpoint,
        /// Endpoint the caller should switch to
        suggested: Endpoint,
        /// Message for the user naming the endpoint to pick
        message: String,
        /// Both endpoints have flagged the query as belonging to the other
        conflicting_history: bool,
    },

    /// The registry call failed or returned an error status
    #[error("Provider failure: {message}")]
    ProviderFailure {
        /// Provider or transport message
        message: String,
        /// Status code, when the registry returned one
        status_code: Option<u16>,
    },

    /// The attempt log could not be read
    #[error("Store error: {0}")]
    Store(String),
}

impl ResolveError {
    /// True if the error was decided without calling a registry
    pub fn is_local(&self) -> bool {
        !matches!(self, ResolveError::ProviderFailure { .. })
    }
}
