//! Trait definitions for external interactions
//!
//! These traits define the boundaries between resolution logic and
//! infrastructure. Implementations live in other crates.

use crate::{AttemptId, AttemptLog, Endpoint, QueryKind, VehicleQuery};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Read-only view over the attempt log
///
/// Implemented by the infrastructure layer (regula-store). The resolution
/// engine only ever sees this trait, so it has no way to mutate history.
pub trait AttemptLogStore {
    /// Error type for store operations
    type Error;

    /// All recorded attempts for `(kind, value)`, newest first
    ///
    /// Capped to the store's configured history limit. Returns an empty
    /// vector when nothing matches; "no history" is not an error.
    fn find_attempts(&self, kind: QueryKind, value: &str) -> Result<Vec<AttemptLog>, Self::Error>;
}

impl<T: AttemptLogStore + ?Sized> AttemptLogStore for Arc<T> {
    type Error = T::Error;

    fn find_attempts(&self, kind: QueryKind, value: &str) -> Result<Vec<AttemptLog>, Self::Error> {
        (**self).find_attempts(kind, value)
    }
}

/// Append side of the attempt log
///
/// Used by the invocation collaborator that records each provider call.
/// Entries are never updated or deleted once appended.
pub trait AttemptLogWriter {
    /// Error type for write operations
    type Error;

    /// Append a new entry, returning its identifier
    fn append(&self, log: AttemptLog) -> Result<AttemptId, Self::Error>;
}

/// Opaque credentials forwarded to a registry
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token or API key
    pub token: String,
}

impl Credentials {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("token", &"<redacted>").finish()
    }
}

/// One lookup to perform against an external registry
#[derive(Debug, Clone)]
pub struct LookupRequest {
    /// Normalized query
    pub query: VehicleQuery,

    /// Registry to ask
    pub endpoint: Endpoint,

    /// Optional region (state code) the caller believes the vehicle is registered in
    pub region_hint: Option<String>,

    /// Per-request credentials, if the registry needs them
    pub credentials: Option<Credentials>,
}

/// A registry's answer
///
/// Transport-level failures are reported through the provider's error type
/// instead; this carries what the registry itself said.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// Whether the registry returned vehicle data
    pub success: bool,

    /// Vehicle data (present when `success`)
    pub payload: Option<Value>,

    /// Registry error text (present when not `success`)
    pub error_message: Option<String>,

    /// HTTP-ish status code, when the transport has one
    pub status_code: Option<u16>,
}

impl ProviderResponse {
    /// A successful response carrying `payload`
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error_message: None,
            status_code: Some(200),
        }
    }

    /// An unsuccessful response
    pub fn failure(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            success: false,
            payload: None,
            error_message: Some(message.into()),
            status_code,
        }
    }
}

/// Trait for external vehicle-registry lookups
///
/// Implemented by the infrastructure layer (regula-provider). Calls may be
/// slow, rate-limited and billed per invocation.
pub trait LookupProvider {
    /// Error type for transport-level failures
    type Error;

    /// Perform one lookup
    fn invoke(
        &self,
        request: &LookupRequest,
    ) -> impl Future<Output = Result<ProviderResponse, Self::Error>> + Send;
}
