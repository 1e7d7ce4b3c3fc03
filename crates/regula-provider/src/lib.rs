//! Regula Lookup Provider Layer
//!
//! Implementations of the `LookupProvider` trait from `regula-domain`.
//!
//! # Providers
//!
//! - [`MockProvider`]: deterministic, call-counting mock for testing
//! - [`HttpRegistryProvider`]: JSON-over-HTTP client for one registry
//! - [`RegistryRouter`]: dispatches each request to the provider for its endpoint
//! - [`RecordingProvider`]: wraps another provider and appends an attempt log
//!   entry for every call, in the background
//!
//! # Examples
//!
//! ```
//! use regula_provider::MockProvider;
//!
//! let provider = MockProvider::new(serde_json::json!({ "modelo": "GOL" }));
//! assert_eq!(provider.call_count(), 0);
//! ```

#![warn(missing_docs)]

pub mod http;
pub mod recording;
pub mod router;

use regula_domain::traits::{LookupProvider, LookupRequest, ProviderResponse};
use regula_domain::Endpoint;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use http::HttpRegistryProvider;
pub use recording::RecordingProvider;
pub use router::RegistryRouter;

/// Errors that can occur while talking to a registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Registry answered with something we could not parse
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No provider configured for the requested endpoint
    #[error("Endpoint not available: {0}")]
    EndpointUnavailable(Endpoint),

    /// Provider could not be constructed
    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Response(ProviderResponse),
    TransportError(String),
}

/// Mock lookup provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. Replies
/// can be scripted per query value; everything else gets the default payload.
///
/// # Examples
///
/// ```
/// use regula_domain::traits::ProviderResponse;
/// use regula_provider::MockProvider;
/// use serde_json::json;
///
/// let provider = MockProvider::new(json!({ "modelo": "GOL" }))
///     .with_response("ABC1234", ProviderResponse::failure("Veículo não encontrado", Some(404)))
///     .with_transport_error("XYZ9876", "connection reset");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_payload: Value,
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    requests: Arc<Mutex<Vec<LookupRequest>>>,
}

impl MockProvider {
    /// Create a mock answering every query successfully with `payload`
    pub fn new(payload: Value) -> Self {
        Self {
            default_payload: payload,
            replies: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a specific response for a normalized query value
    pub fn with_response(self, value: impl Into<String>, response: ProviderResponse) -> Self {
        self.lock_replies().insert(value.into(), MockReply::Response(response));
        self
    }

    /// Script a transport-level failure for a normalized query value
    pub fn with_transport_error(self, value: impl Into<String>, message: impl Into<String>) -> Self {
        self.lock_replies()
            .insert(value.into(), MockReply::TransportError(message.into()));
        self
    }

    /// Number of times `invoke` was called
    pub fn call_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// Every request seen so far, oldest first
    pub fn requests(&self) -> Vec<LookupRequest> {
        self.lock_requests().clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        self.lock_requests().clear();
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, HashMap<String, MockReply>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<LookupRequest>> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(serde_json::json!({ "mock": true }))
    }
}

impl LookupProvider for MockProvider {
    type Error = ProviderError;

    async fn invoke(&self, request: &LookupRequest) -> Result<ProviderResponse, Self::Error> {
        self.lock_requests().push(request.clone());

        let reply = self.lock_replies().get(request.query.value()).cloned();
        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::TransportError(message)) => Err(ProviderError::Communication(message)),
            None => Ok(ProviderResponse::ok(self.default_payload.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regula_domain::{QueryKind, QueryNormalizer};
    use serde_json::json;

    fn request(value: &str) -> LookupRequest {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        LookupRequest {
            query: normalizer.normalize(QueryKind::Plate, value).unwrap(),
            endpoint: Endpoint::Regional,
            region_hint: Some("SP".to_string()),
            credentials: None,
        }
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new(json!({ "modelo": "GOL" }));
        let response = provider.invoke(&request("ABC1234")).await.unwrap();
        assert!(response.success);
        assert_eq!(response.payload, Some(json!({ "modelo": "GOL" })));
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_failure() {
        let provider = MockProvider::default()
            .with_response("ABC1234", ProviderResponse::failure("Veículo não encontrado", Some(404)));

        let response = provider.invoke(&request("ABC1234")).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.status_code, Some(404));

        let other = provider.invoke(&request("XYZ9876")).await.unwrap();
        assert!(other.success);
    }

    #[tokio::test]
    async fn test_mock_provider_transport_error() {
        let provider = MockProvider::default().with_transport_error("ABC1234", "connection reset");
        let result = provider.invoke(&request("ABC1234")).await;
        assert!(matches!(result, Err(ProviderError::Communication(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::default();
        assert_eq!(provider.call_count(), 0);

        provider.invoke(&request("ABC1234")).await.unwrap();
        provider.invoke(&request("ABC1234")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.requests()[0].region_hint.as_deref(), Some("SP"));

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::default();
        let provider2 = provider1.clone();

        provider1.invoke(&request("ABC1234")).await.unwrap();

        // Both share the same request log due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
