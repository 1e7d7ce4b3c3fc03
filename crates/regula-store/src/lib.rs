//! Regula Storage Layer
//!
//! Attempt log stores implementing the read interface the resolver consumes
//! ([`AttemptLogStore`]) and the append interface the invocation collaborator
//! writes through ([`AttemptLogWriter`]).
//!
//! # Stores
//!
//! - [`SqliteAttemptStore`]: durable, single-table SQLite log with triggers
//!   refusing updates and deletes
//! - [`InMemoryAttemptStore`]: process-local log for tests and demos
//!
//! # Examples
//!
//! ```no_run
//! use regula_store::SqliteAttemptStore;
//!
//! let store = SqliteAttemptStore::new(":memory:").unwrap();
//! // Store is now ready for attempt log reads and appends
//! ```

#![warn(missing_docs)]

mod memory;

pub use memory::InMemoryAttemptStore;

use chrono::{DateTime, Utc};
use regula_domain::traits::{AttemptLogStore, AttemptLogWriter};
use regula_domain::{
    AttemptId, AttemptLog, AttemptOutcome, Endpoint, ErrorClass, ExtractedAttributes, QueryKind,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Default number of entries returned per query
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Entry with this id already exists
    #[error("Duplicate attempt id: {0}")]
    Duplicate(AttemptId),

    /// A previous holder of the connection lock panicked
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// SQLite-based attempt log
///
/// The connection sits behind a mutex so the store is `Send + Sync` and can be
/// shared between the resolver and a background writer.
pub struct SqliteAttemptStore {
    conn: Mutex<Connection>,
    history_limit: usize,
}

impl SqliteAttemptStore {
    /// Open (or create) a store at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use regula_store::SqliteAttemptStore;
    ///
    /// let store = SqliteAttemptStore::new("regula.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// Cap the number of entries returned by [`AttemptLogStore::find_attempts`]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Configured history cap
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Total number of entries across all queries
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM attempt_logs", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn id_to_bytes(id: AttemptId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    fn bytes_to_id(bytes: &[u8]) -> Result<AttemptId, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!("Expected 16 bytes for AttemptId, got {}", bytes.len()))
        })?;
        Ok(AttemptId::from_value(u128::from_be_bytes(arr)))
    }

    fn timestamp_from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
        DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| StoreError::InvalidData(format!("Timestamp out of range: {}", ms)))
    }

    fn row_to_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttemptLog> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes).map_err(conversion(0, Type::Blob))?;

        let kind_str: String = row.get(1)?;
        let query_kind = QueryKind::parse(&kind_str).ok_or_else(|| {
            conversion(1, Type::Text)(StoreError::InvalidData(format!("Unknown query kind: {}", kind_str)))
        })?;

        let endpoint_str: String = row.get(3)?;
        let endpoint = Endpoint::parse(&endpoint_str).ok_or_else(|| {
            conversion(3, Type::Text)(StoreError::InvalidData(format!("Unknown endpoint: {}", endpoint_str)))
        })?;

        let succeeded: bool = row.get(4)?;
        let outcome = if succeeded {
            let payload_text: String = row.get(5)?;
            let payload = serde_json::from_str(&payload_text).map_err(conversion(5, Type::Text))?;
            AttemptOutcome::Succeeded { payload }
        } else {
            let error_message: Option<String> = row.get(6)?;
            let class_str: String = row.get(7)?;
            AttemptOutcome::Failed {
                error_message: error_message.unwrap_or_default(),
                error_class: ErrorClass::parse(&class_str).unwrap_or(ErrorClass::Unknown),
            }
        };

        let created_at = Self::timestamp_from_millis(row.get(8)?).map_err(conversion(8, Type::Integer))?;

        let extracted_text: String = row.get(9)?;
        let extracted: ExtractedAttributes =
            serde_json::from_str(&extracted_text).map_err(conversion(9, Type::Text))?;

        Ok(AttemptLog {
            id,
            query_kind,
            query_value: row.get(2)?,
            endpoint,
            outcome,
            created_at,
            extracted,
        })
    }
}

/// Wrap a decoding error as a rusqlite conversion failure for column `col`
fn conversion<E>(col: usize, ty: Type) -> impl FnOnce(E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| rusqlite::Error::FromSqlConversionFailure(col, ty, Box::new(e))
}

impl AttemptLogStore for SqliteAttemptStore {
    type Error = StoreError;

    fn find_attempts(&self, kind: QueryKind, value: &str) -> Result<Vec<AttemptLog>, Self::Error> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, query_kind, query_value, endpoint, succeeded, payload, error_message,
                    error_class, created_at_ms, extracted
             FROM attempt_logs
             WHERE query_kind = ?1 AND query_value = ?2
             ORDER BY created_at_ms DESC, id DESC
             LIMIT ?3",
        )?;

        let logs = stmt
            .query_map(params![kind.as_str(), value, self.history_limit as i64], Self::row_to_log)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }
}

impl AttemptLogWriter for SqliteAttemptStore {
    type Error = StoreError;

    fn append(&self, log: AttemptLog) -> Result<AttemptId, Self::Error> {
        let (succeeded, payload, error_message, error_class) = match &log.outcome {
            AttemptOutcome::Succeeded { payload } => (true, Some(serde_json::to_string(payload)?), None, None),
            AttemptOutcome::Failed {
                error_message,
                error_class,
            } => (false, None, Some(error_message.clone()), Some(error_class.as_str())),
        };
        let extracted = serde_json::to_string(&log.extracted)?;

        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let result = conn.execute(
            "INSERT INTO attempt_logs (id, query_kind, query_value, endpoint, succeeded, payload,
                                       error_message, error_class, created_at_ms, extracted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                Self::id_to_bytes(log.id),
                log.query_kind.as_str(),
                &log.query_value,
                log.endpoint.as_str(),
                succeeded,
                payload,
                error_message,
                error_class,
                log.created_at.timestamp_millis(),
                extracted,
            ],
        );

        match result {
            Ok(_) => {
                tracing::debug!(id = %log.id, kind = %log.query_kind, endpoint = %log.endpoint, "appended attempt log");
                Ok(log.id)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(StoreError::Duplicate(log.id))
            }
            Err(e) => Err(e.into()),
        }
    }
}
