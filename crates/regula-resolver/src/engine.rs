//! Resolution engine
//!
//! Decides, per query, between serving a cached attempt, replaying a known
//! failure, or calling a registry, then reconciles a fresh fetch with the
//! attempt log written on its behalf.

use crate::memo::check_history;
use crate::{ResolveError, ResolverConfig};
use chrono::Utc;
use regula_domain::traits::{AttemptLogStore, Credentials, LookupProvider, LookupRequest};
use regula_domain::{
    is_fresh, AttemptId, AttemptLog, Endpoint, KindInference, QueryKind, QueryNormalizer, ResolutionResult,
    ShapeHeuristic, VehicleQuery,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;

/// What the caller wants resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Identifier kind; `None` lets the engine infer it from the value's shape
    pub kind: Option<QueryKind>,

    /// Raw identifier as typed by the user
    pub value: String,

    /// Registry to resolve against
    pub endpoint: Endpoint,

    /// Region (state code) forwarded to the registry
    pub region_hint: Option<String>,
}

impl ResolveRequest {
    /// A request with an explicit kind
    pub fn new(kind: QueryKind, value: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            kind: Some(kind),
            value: value.into(),
            endpoint,
            region_hint: None,
        }
    }

    /// A request whose kind is inferred from the value
    pub fn inferred(value: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            kind: None,
            value: value.into(),
            endpoint,
            region_hint: None,
        }
    }

    /// Attach a region hint
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_hint = Some(region.into());
        self
    }
}

/// Per-resolution settings, passed explicitly on every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    /// Cache TTL in days; zero disables cache hits
    pub ttl_days: u32,

    /// Credentials forwarded to the registry
    pub credentials: Option<Credentials>,
}

impl LookupSettings {
    /// Settings with the given TTL and no credentials
    pub fn new(ttl_days: u32) -> Self {
        Self {
            ttl_days,
            credentials: None,
        }
    }

    /// Take the TTL from a resolver configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.ttl_days)
    }

    /// Attach credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

/// Bounded wait-then-read-back after a fresh fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadbackPolicy {
    /// Sleep before each read
    pub delay: Duration,

    /// Number of rounds; never fewer than one once installed on a resolver
    pub attempts: u32,
}

impl From<&ResolverConfig> for ReadbackPolicy {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            delay: config.readback_delay(),
            attempts: config.readback_attempts,
        }
    }
}

impl Default for ReadbackPolicy {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

/// Outcome of inspecting history, before any registry call
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// A fresh successful attempt can be served
    CacheHit(Box<AttemptLog>),

    /// The registry has to be asked
    MustFetch,
}

/// Normalized query plus what history said about it
struct Inspection {
    query: VehicleQuery,
    seen: HashSet<AttemptId>,
    decision: Decision,
}

/// The resolution engine
///
/// Stateless between calls: everything it knows about a query comes from the
/// attempt log, and everything it returns is built per call. Safe to share
/// across tasks when the store and provider are.
///
/// # Examples
///
/// ```
/// use regula_domain::{Endpoint, QueryKind};
/// use regula_provider::MockProvider;
/// use regula_resolver::{LookupSettings, ResolveRequest, Resolver};
/// use regula_store::InMemoryAttemptStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = Resolver::new(InMemoryAttemptStore::new(), MockProvider::default());
/// let request = ResolveRequest::new(QueryKind::Plate, "abc-1234", Endpoint::Regional);
///
/// let result = resolver.resolve(&request, &LookupSettings::new(30)).await?;
/// assert!(!result.from_cache);
/// # Ok(())
/// # }
/// ```
pub struct Resolver<S, P, I = ShapeHeuristic> {
    store: S,
    provider: P,
    normalizer: QueryNormalizer<I>,
    readback: ReadbackPolicy,
}

impl<S, P> Resolver<S, P, ShapeHeuristic> {
    /// Create a resolver with shape-based kind inference and default read-back
    pub fn new(store: S, provider: P) -> Self {
        Self {
            store,
            provider,
            normalizer: QueryNormalizer::default(),
            readback: ReadbackPolicy::default(),
        }
    }
}

impl<S, P, I> Resolver<S, P, I>
where
    S: AttemptLogStore,
    S::Error: Display,
    P: LookupProvider,
    P::Error: Display,
    I: KindInference,
{
    /// Swap the kind inference strategy
    pub fn with_normalizer<J: KindInference>(self, normalizer: QueryNormalizer<J>) -> Resolver<S, P, J> {
        Resolver {
            store: self.store,
            provider: self.provider,
            normalizer,
            readback: self.readback,
        }
    }

    /// Override the read-back policy
    ///
    /// At least one round always runs; `attempts: 0` is treated as 1.
    pub fn with_readback(mut self, readback: ReadbackPolicy) -> Self {
        self.readback = ReadbackPolicy {
            attempts: readback.attempts.max(1),
            ..readback
        };
        self
    }

    /// Take the read-back policy from a configuration
    pub fn with_config(self, config: &ResolverConfig) -> Self {
        self.with_readback(ReadbackPolicy::from(config))
    }

    /// The attempt log this resolver reads
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The provider this resolver calls
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Inspect history without calling a registry
    ///
    /// Returns the same short-circuit errors [`Resolver::resolve`] would.
    pub fn decide(&self, request: &ResolveRequest, settings: &LookupSettings) -> Result<Decision, ResolveError> {
        self.inspect(request, settings).map(|inspection| inspection.decision)
    }

    /// Resolve a query to vehicle data
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidQuery`] for malformed input (store untouched)
    /// - [`ResolveError::WrongEndpoint`] / [`ResolveError::RepeatedFailure`]
    ///   when history already answers the query with a failure
    /// - [`ResolveError::ProviderFailure`] when the registry call fails
    /// - [`ResolveError::Store`] when history cannot be read
    pub async fn resolve(
        &self,
        request: &ResolveRequest,
        settings: &LookupSettings,
    ) -> Result<ResolutionResult, ResolveError> {
        let Inspection { query, seen, decision } = self.inspect(request, settings)?;

        if let Decision::CacheHit(log) = decision {
            tracing::info!(query = %query, attempt = %log.id, endpoint = %log.endpoint, "cache hit");
            return ResolutionResult::from_log(*log)
                .ok_or_else(|| ResolveError::Store("cached attempt carries no payload".to_string()));
        }

        tracing::info!(query = %query, endpoint = %request.endpoint, "fetching from registry");
        let lookup = LookupRequest {
            query: query.clone(),
            endpoint: request.endpoint,
            region_hint: request.region_hint.clone(),
            credentials: settings.credentials.clone(),
        };

        let response = self
            .provider
            .invoke(&lookup)
            .await
            .map_err(|e| ResolveError::ProviderFailure {
                message: e.to_string(),
                status_code: None,
            })?;
        let fetched_at = Utc::now();

        if !response.success {
            return Err(ResolveError::ProviderFailure {
                message: response
                    .error_message
                    .unwrap_or_else(|| "registry reported a failure".to_string()),
                status_code: response.status_code,
            });
        }
        let payload = response.payload.ok_or_else(|| ResolveError::ProviderFailure {
            message: "registry reported success without a payload".to_string(),
            status_code: response.status_code,
        })?;

        let read_back = self.read_back(&query, request.endpoint, &seen).await;
        if read_back.is_none() {
            tracing::warn!(query = %query, "no attempt log found after fetch; returning result without log id");
        }

        Ok(ResolutionResult::fetched(payload, fetched_at, read_back))
    }

    fn inspect(&self, request: &ResolveRequest, settings: &LookupSettings) -> Result<Inspection, ResolveError> {
        let query = match request.kind {
            Some(kind) => self.normalizer.normalize(kind, &request.value)?,
            None => self.normalizer.normalize_inferred(&request.value)?,
        };
        tracing::debug!(query = %query, endpoint = %request.endpoint, "inspecting history");

        let history = self
            .store
            .find_attempts(query.kind(), query.value())
            .map_err(|e| ResolveError::Store(e.to_string()))?;

        check_history(&query, request.endpoint, &history)?;

        let seen = history.iter().map(|log| log.id).collect();
        let cached = history
            .into_iter()
            .filter(|log| log.matches(&query) && is_fresh(log, settings.ttl_days))
            .max_by_key(|log| log.created_at);

        let decision = match cached {
            Some(log) => Decision::CacheHit(Box::new(log)),
            None => Decision::MustFetch,
        };

        Ok(Inspection { query, seen, decision })
    }

    /// Look for the attempt written on behalf of the fetch just made
    async fn read_back(&self, query: &VehicleQuery, endpoint: Endpoint, seen: &HashSet<AttemptId>) -> Option<AttemptLog> {
        for round in 1..=self.readback.attempts {
            tokio::time::sleep(self.readback.delay).await;

            let logs = match self.store.find_attempts(query.kind(), query.value()) {
                Ok(logs) => logs,
                Err(e) => {
                    tracing::warn!(query = %query, "read-back failed: {}", e);
                    return None;
                }
            };

            let found = logs
                .into_iter()
                .filter(|log| {
                    log.matches(query) && log.endpoint == endpoint && log.is_success() && !seen.contains(&log.id)
                })
                .max_by_key(|log| log.created_at);

            match found {
                Some(log) => {
                    tracing::debug!(query = %query, attempt = %log.id, round, "read-back found attempt");
                    return Some(log);
                }
                None => tracing::debug!(query = %query, round, "read-back round found nothing"),
            }
        }
        None
    }
}
