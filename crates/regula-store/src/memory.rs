//! Process-local attempt log

use crate::{StoreError, DEFAULT_HISTORY_LIMIT};
use regula_domain::traits::{AttemptLogStore, AttemptLogWriter};
use regula_domain::{AttemptId, AttemptLog, QueryKind};
use std::sync::RwLock;

/// In-memory attempt log
///
/// Same ordering and capping semantics as the SQLite store, without
/// durability. Useful for tests and for wiring demos.
///
/// # Examples
///
/// ```
/// use regula_domain::traits::{AttemptLogStore, AttemptLogWriter};
/// use regula_domain::{AttemptLog, Endpoint, QueryKind, QueryNormalizer};
/// use regula_store::InMemoryAttemptStore;
///
/// let store = InMemoryAttemptStore::new();
/// let normalizer: QueryNormalizer = QueryNormalizer::default();
/// let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
/// store.append(AttemptLog::succeeded(&query, Endpoint::Regional, serde_json::json!({}))).unwrap();
///
/// assert_eq!(store.find_attempts(QueryKind::Plate, "ABC1234").unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryAttemptStore {
    logs: RwLock<Vec<AttemptLog>>,
    history_limit: usize,
}

impl InMemoryAttemptStore {
    /// Create an empty store with the default history cap
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Create a store pre-seeded with entries
    pub fn with_logs(logs: impl IntoIterator<Item = AttemptLog>) -> Self {
        Self {
            logs: RwLock::new(logs.into_iter().collect()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Cap the number of entries returned per query
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Total number of entries across all queries
    pub fn len(&self) -> usize {
        self.logs.read().map(|logs| logs.len()).unwrap_or(0)
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAttemptStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptLogStore for InMemoryAttemptStore {
    type Error = StoreError;

    fn find_attempts(&self, kind: QueryKind, value: &str) -> Result<Vec<AttemptLog>, Self::Error> {
        let logs = self.logs.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut matching: Vec<AttemptLog> = logs
            .iter()
            .filter(|log| log.query_kind == kind && log.query_value == value)
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching.truncate(self.history_limit);
        Ok(matching)
    }
}

impl AttemptLogWriter for InMemoryAttemptStore {
    type Error = StoreError;

    fn append(&self, log: AttemptLog) -> Result<AttemptId, Self::Error> {
        let mut logs = self.logs.write().map_err(|_| StoreError::LockPoisoned)?;
        if logs.iter().any(|existing| existing.id == log.id) {
            return Err(StoreError::Duplicate(log.id));
        }
        let id = log.id;
        logs.push(log);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use regula_domain::{Endpoint, ErrorClass, QueryNormalizer, VehicleQuery};
    use serde_json::json;

    fn plate(value: &str) -> VehicleQuery {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        normalizer.normalize(QueryKind::Plate, value).unwrap()
    }

    #[test]
    fn test_newest_first() {
        let query = plate("ABC1234");
        let now = Utc::now();
        let old = AttemptLog::failed(&query, Endpoint::Regional, "x", ErrorClass::Unknown)
            .with_created_at(now - Duration::days(2));
        let new = AttemptLog::succeeded(&query, Endpoint::National, json!({}))
            .with_created_at(now);
        let store = InMemoryAttemptStore::with_logs([old.clone(), new.clone()]);

        let found = store.find_attempts(QueryKind::Plate, "ABC1234").unwrap();
        assert_eq!(found, vec![new, old]);
    }

    #[test]
    fn test_filters_by_query() {
        let store = InMemoryAttemptStore::new();
        store.append(AttemptLog::succeeded(&plate("ABC1234"), Endpoint::Regional, json!({}))).unwrap();
        store.append(AttemptLog::succeeded(&plate("XYZ9876"), Endpoint::Regional, json!({}))).unwrap();

        assert_eq!(store.find_attempts(QueryKind::Plate, "ABC1234").unwrap().len(), 1);
        assert!(store.find_attempts(QueryKind::Renavam, "ABC1234").unwrap().is_empty());
    }

    #[test]
    fn test_history_cap() {
        let query = plate("ABC1234");
        let store = InMemoryAttemptStore::new().with_history_limit(3);
        for _ in 0..5 {
            store.append(AttemptLog::succeeded(&query, Endpoint::Regional, json!({}))).unwrap();
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.find_attempts(QueryKind::Plate, "ABC1234").unwrap().len(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let log = AttemptLog::succeeded(&plate("ABC1234"), Endpoint::Regional, json!({}));
        let store = InMemoryAttemptStore::new();
        store.append(log.clone()).unwrap();
        assert!(matches!(store.append(log), Err(StoreError::Duplicate(_))));
    }
}
