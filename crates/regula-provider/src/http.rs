//! HTTP Registry Provider
//!
//! JSON-over-HTTP client for one external vehicle registry. The regional and
//! national registries expose the same contract and differ only by base URL
//! and credentials.
//!
//! # Contract
//!
//! `POST {base_url}/lookup` with `{ "kind", "value", "region" }`. A 2xx JSON
//! body is the vehicle payload unless it is an envelope with `"success": false`.
//! Any other status is an unsuccessful response carrying the body text.
//!
//! No retries happen here: every call may be billed, so retry is left to the
//! user.

use crate::ProviderError;
use regula_domain::traits::{LookupProvider, LookupRequest, ProviderResponse};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Default timeout for registry requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Envelope fields registries use for error text
const MESSAGE_FIELDS: &[&str] = &["message", "mensagem", "error", "erro"];

/// Registry provider speaking JSON over HTTP
pub struct HttpRegistryProvider {
    base_url: String,
    client: reqwest::Client,
}

/// Request body for the lookup API
#[derive(Serialize)]
struct LookupBody<'a> {
    kind: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

impl HttpRegistryProvider {
    /// Create a provider for the registry at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use regula_provider::HttpRegistryProvider;
    /// use std::time::Duration;
    ///
    /// let provider = HttpRegistryProvider::new("https://registry.example/api", Duration::from_secs(10)).unwrap();
    /// ```
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a provider with the default timeout
    pub fn with_default_timeout(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform the lookup
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Communication`] if the registry cannot be
    /// reached, and [`ProviderError::InvalidResponse`] if a 2xx body is not JSON.
    pub async fn lookup(&self, request: &LookupRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/lookup", self.base_url);
        let body = LookupBody {
            kind: request.query.kind().as_str(),
            value: request.query.value(),
            region: request.region_hint.as_deref(),
        };

        let mut builder = self.client.post(&url).json(&body);
        if let Some(credentials) = &request.credentials {
            builder = builder.bearer_auth(&credentials.token);
        }

        tracing::debug!(%url, query = %request.query, endpoint = %request.endpoint, "registry lookup");

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = extract_message(&error_text).unwrap_or(error_text);
            return Ok(ProviderResponse::failure(message, Some(status.as_u16())));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(interpret_payload(payload, status.as_u16()))
    }
}

/// Turn a 2xx body into a response, unwrapping `{ "success": false }` envelopes
fn interpret_payload(payload: Value, status: u16) -> ProviderResponse {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        let message = MESSAGE_FIELDS
            .iter()
            .find_map(|k| payload.get(*k).and_then(Value::as_str))
            .unwrap_or("registry reported failure")
            .to_string();
        return ProviderResponse::failure(message, Some(status));
    }

    let mut response = ProviderResponse::ok(payload);
    response.status_code = Some(status);
    response
}

/// Pull a message field out of a JSON error body, if it is one
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    MESSAGE_FIELDS
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

impl LookupProvider for HttpRegistryProvider {
    type Error = ProviderError;

    async fn invoke(&self, request: &LookupRequest) -> Result<ProviderResponse, Self::Error> {
        self.lookup(request).await
    }
}
