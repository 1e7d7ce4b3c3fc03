//! Endpoint-based dispatch across registry providers

use crate::ProviderError;
use regula_domain::traits::{LookupProvider, LookupRequest, ProviderResponse};
use regula_domain::Endpoint;
use std::collections::HashMap;

/// Routes each lookup to the provider registered for its endpoint
///
/// The resolver treats both registries uniformly through one
/// [`LookupProvider`]; this is where they are told apart.
pub struct RegistryRouter<P> {
    routes: HashMap<Endpoint, P>,
}

impl<P> RegistryRouter<P> {
    /// Create a router with no endpoints
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register `provider` for `endpoint`, replacing any previous one
    pub fn with_route(mut self, endpoint: Endpoint, provider: P) -> Self {
        self.routes.insert(endpoint, provider);
        self
    }

    /// Endpoints that currently have a provider
    pub fn endpoints(&self) -> Vec<Endpoint> {
        Endpoint::ALL
            .into_iter()
            .filter(|e| self.routes.contains_key(e))
            .collect()
    }
}

impl<P> Default for RegistryRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> LookupProvider for RegistryRouter<P>
where
    P: LookupProvider<Error = ProviderError> + Sync,
{
    type Error = ProviderError;

    async fn invoke(&self, request: &LookupRequest) -> Result<ProviderResponse, Self::Error> {
        match self.routes.get(&request.endpoint) {
            Some(provider) => provider.invoke(request).await,
            None => Err(ProviderError::EndpointUnavailable(request.endpoint)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use regula_domain::{QueryKind, QueryNormalizer};
    use serde_json::json;

    fn request(endpoint: Endpoint) -> LookupRequest {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        LookupRequest {
            query: normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap(),
            endpoint,
            region_hint: None,
            credentials: None,
        }
    }

    #[tokio::test]
    async fn test_dispatches_by_endpoint() {
        let regional = MockProvider::new(json!({ "source": "regional" }));
        let national = MockProvider::new(json!({ "source": "national" }));
        let router = RegistryRouter::new()
            .with_route(Endpoint::Regional, regional.clone())
            .with_route(Endpoint::National, national.clone());

        let response = router.invoke(&request(Endpoint::National)).await.unwrap();
        assert_eq!(response.payload, Some(json!({ "source": "national" })));
        assert_eq!(regional.call_count(), 0);
        assert_eq!(national.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_route() {
        let router = RegistryRouter::new().with_route(Endpoint::Regional, MockProvider::default());
        assert_eq!(router.endpoints(), vec![Endpoint::Regional]);

        let result = router.invoke(&request(Endpoint::National)).await;
        assert_eq!(result, Err(ProviderError::EndpointUnavailable(Endpoint::National)));
    }
}
