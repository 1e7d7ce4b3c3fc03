//! Command implementations.

pub mod history;
pub mod infer;
pub mod resolve;

pub use self::history::execute_history;
pub use self::infer::execute_infer;
pub use self::resolve::execute_resolve;

use crate::config::Config;
use crate::error::Result;
use regula_domain::{QueryKind, QueryNormalizer, VehicleQuery};
use regula_store::SqliteAttemptStore;
use std::fs;

/// Open the attempt log named by the configuration, creating its directory.
pub(crate) fn open_store(config: &Config) -> Result<SqliteAttemptStore> {
    let path = config.store_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    tracing::debug!(path = %path.display(), "opening attempt log");
    Ok(SqliteAttemptStore::new(&path)?.with_history_limit(config.resolver.history_limit))
}

/// Normalize a value, inferring its kind when none was given.
pub(crate) fn normalize(kind: Option<QueryKind>, value: &str) -> Result<VehicleQuery> {
    let normalizer: QueryNormalizer = QueryNormalizer::default();
    let query = match kind {
        Some(kind) => normalizer.normalize(kind, value)?,
        None => normalizer.normalize_inferred(value)?,
    };
    Ok(query)
}
