//! Resolution result handed back to callers

use crate::{AttemptId, AttemptLog};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Outcome of a successful resolution
///
/// Ephemeral: returned to the caller and never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    /// True when the payload was taken verbatim from an existing attempt log
    pub from_cache: bool,

    /// Vehicle data
    pub payload: Value,

    /// When the payload was obtained from the registry
    pub last_updated_at: DateTime<Utc>,

    /// Canonical log entry id; `None` when a fresh fetch could not be read back
    pub attempt_log_id: Option<AttemptId>,

    /// The log entry the result is anchored to, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_log: Option<AttemptLog>,
}

impl ResolutionResult {
    /// Build a cache hit from a fresh successful log
    ///
    /// Returns `None` if the log is a failure (it has no payload to serve).
    pub fn from_log(log: AttemptLog) -> Option<Self> {
        let payload = log.payload()?.clone();
        Some(Self {
            from_cache: true,
            payload,
            last_updated_at: log.created_at,
            attempt_log_id: Some(log.id),
            source_log: Some(log),
        })
    }

    /// Build a result for a payload just fetched from a registry
    ///
    /// `fetched_at` is when the registry answered. The read-back log's own
    /// timestamp wins when there is one.
    pub fn fetched(payload: Value, fetched_at: DateTime<Utc>, read_back: Option<AttemptLog>) -> Self {
        Self {
            from_cache: false,
            payload,
            last_updated_at: read_back.as_ref().map_or(fetched_at, |log| log.created_at),
            attempt_log_id: read_back.as_ref().map(|log| log.id),
            source_log: read_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, ErrorClass, QueryKind, QueryNormalizer};
    use serde_json::json;

    #[test]
    fn test_cache_hit_uses_log_timestamp() {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
        let log = AttemptLog::succeeded(&query, Endpoint::National, json!({"placa": "ABC1234"}));
        let result = ResolutionResult::from_log(log.clone()).unwrap();

        assert!(result.from_cache);
        assert_eq!(result.payload, json!({"placa": "ABC1234"}));
        assert_eq!(result.last_updated_at, log.created_at);
        assert_eq!(result.attempt_log_id, Some(log.id));
    }

    #[test]
    fn test_failed_log_is_not_a_cache_hit() {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
        let log = AttemptLog::failed(&query, Endpoint::National, "nope", ErrorClass::Unknown);
        assert!(ResolutionResult::from_log(log).is_none());
    }

    #[test]
    fn test_fetched_without_read_back() {
        let fetched_at = Utc::now() - chrono::Duration::seconds(2);
        let result = ResolutionResult::fetched(json!({"ok": true}), fetched_at, None);
        assert!(!result.from_cache);
        assert_eq!(result.attempt_log_id, None);
        assert_eq!(result.last_updated_at, fetched_at);
        assert!(result.source_log.is_none());
    }

    #[test]
    fn test_fetched_takes_read_back_timestamp() {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
        let log = AttemptLog::succeeded(&query, Endpoint::Regional, json!({"ok": true}))
            .with_created_at(Utc::now() - chrono::Duration::seconds(5));

        let result = ResolutionResult::fetched(json!({"ok": true}), Utc::now(), Some(log.clone()));
        assert_eq!(result.last_updated_at, log.created_at);
        assert_eq!(result.attempt_log_id, Some(log.id));
    }
}
