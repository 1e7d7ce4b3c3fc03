//! Recording provider: the invocation collaborator that persists attempts
//!
//! Every call that reaches the registry produces exactly one [`AttemptLog`]
//! entry. The entry is appended from a spawned task after an optional delay,
//! so readers see it with eventual consistency, the same way they would with
//! an out-of-process writer. Transport errors never reached the registry and
//! are only logged, so the caller can retry them.

use regula_domain::traits::{AttemptLogWriter, LookupProvider, LookupRequest, ProviderResponse};
use regula_domain::{AttemptLog, ErrorClass};
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Wraps a provider and records each invocation in the attempt log
pub struct RecordingProvider<P, W> {
    inner: P,
    writer: Arc<W>,
    write_delay: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<P, W> RecordingProvider<P, W> {
    /// Record every call to `inner` through `writer`
    pub fn new(inner: P, writer: Arc<W>) -> Self {
        Self {
            inner,
            writer,
            write_delay: Duration::ZERO,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Delay each append by `delay`
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Wait for every background write started so far
    ///
    /// Short-lived processes call this before exiting so no attempt is lost
    /// with the runtime.
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *self.lock_pending());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("attempt writer task failed: {}", e);
            }
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Build the log entry describing one invocation
///
/// Returns `None` for transport errors: no registry answered, so there is no
/// attempt to record.
pub fn attempt_for<E>(request: &LookupRequest, result: &Result<ProviderResponse, E>) -> Option<AttemptLog> {
    let response = result.as_ref().ok()?;
    let log = if response.success {
        match &response.payload {
            Some(payload) => AttemptLog::succeeded(&request.query, request.endpoint, payload.clone()),
            None => AttemptLog::failed(
                &request.query,
                request.endpoint,
                "registry reported success without a payload",
                ErrorClass::Unknown,
            ),
        }
    } else {
        let message = response
            .error_message
            .clone()
            .unwrap_or_else(|| "registry returned no message".to_string());
        let class = ErrorClass::classify(response.status_code, &message);
        AttemptLog::failed(&request.query, request.endpoint, message, class)
    };
    Some(log)
}

impl<P, W> LookupProvider for RecordingProvider<P, W>
where
    P: LookupProvider + Sync,
    P::Error: Display,
    W: AttemptLogWriter + Send + Sync + 'static,
    W::Error: Display,
{
    type Error = P::Error;

    async fn invoke(&self, request: &LookupRequest) -> Result<ProviderResponse, Self::Error> {
        let result = self.inner.invoke(request).await;
        let log = match attempt_for(request, &result) {
            Some(log) => log,
            None => {
                if let Err(e) = &result {
                    tracing::warn!(query = %request.query, endpoint = %request.endpoint, "registry unreachable, nothing recorded: {}", e);
                }
                return result;
            }
        };

        let writer = Arc::clone(&self.writer);
        let delay = self.write_delay;
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let id = log.id;
            match writer.append(log) {
                Ok(_) => tracing::debug!(%id, "attempt recorded"),
                Err(e) => tracing::error!(%id, "failed to record attempt: {}", e),
            }
        });

        {
            let mut pending = self.lock_pending();
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockProvider, ProviderError};
    use regula_domain::traits::AttemptLogStore;
    use regula_domain::{Endpoint, QueryKind, QueryNormalizer};
    use regula_store::InMemoryAttemptStore;
    use serde_json::json;

    fn request(value: &str) -> LookupRequest {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        LookupRequest {
            query: normalizer.normalize(QueryKind::Plate, value).unwrap(),
            endpoint: Endpoint::Regional,
            region_hint: None,
            credentials: None,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_records_success() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let provider = RecordingProvider::new(MockProvider::new(json!({ "marca": "FIAT" })), Arc::clone(&store));

        provider.invoke(&request("ABC1234")).await.unwrap();
        settle().await;

        let logs = store.find_attempts(QueryKind::Plate, "ABC1234").unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_success());
        assert_eq!(logs[0].extracted.make.as_deref(), Some("FIAT"));
    }

    #[tokio::test]
    async fn test_records_classified_failure() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let mock = MockProvider::default()
            .with_response("ABC1234", ProviderResponse::failure("Veículo não encontrado", Some(404)));
        let provider = RecordingProvider::new(mock, Arc::clone(&store));

        let response = provider.invoke(&request("ABC1234")).await.unwrap();
        assert!(!response.success);
        settle().await;

        let logs = store.find_attempts(QueryKind::Plate, "ABC1234").unwrap();
        assert_eq!(logs[0].error_class(), Some(ErrorClass::NotFound));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_recorded() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let mock = MockProvider::default().with_transport_error("ABC1234", "connection reset");
        let provider = RecordingProvider::new(mock, Arc::clone(&store));

        let result = provider.invoke(&request("ABC1234")).await;
        assert!(matches!(result, Err(ProviderError::Communication(_))));
        provider.flush().await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_registry_fault_is_recorded() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let mock = MockProvider::default()
            .with_response("ABC1234", ProviderResponse::failure("Serviço indisponível", Some(503)));
        let provider = RecordingProvider::new(mock, Arc::clone(&store));

        provider.invoke(&request("ABC1234")).await.unwrap();
        provider.flush().await;

        let logs = store.find_attempts(QueryKind::Plate, "ABC1234").unwrap();
        assert_eq!(logs[0].error_class(), Some(ErrorClass::ProviderFault));
    }

    #[tokio::test]
    async fn test_write_is_delayed() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let provider = RecordingProvider::new(MockProvider::default(), Arc::clone(&store))
            .with_write_delay(Duration::from_millis(200));

        provider.invoke(&request("ABC1234")).await.unwrap();
        settle().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_flush_waits_for_delayed_write() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let provider = RecordingProvider::new(MockProvider::default(), Arc::clone(&store))
            .with_write_delay(Duration::from_millis(100));

        provider.invoke(&request("ABC1234")).await.unwrap();
        provider.invoke(&request("XYZ9876")).await.unwrap();
        provider.flush().await;

        assert_eq!(store.len(), 2);
    }
}
