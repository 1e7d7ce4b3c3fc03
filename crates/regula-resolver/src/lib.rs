//! Regula Resolver
//!
//! Resolution engine that answers vehicle lookups from the attempt log when it
//! can, and from an external registry when it must.
//!
//! # Overview
//!
//! Every call to [`Resolver::resolve`] walks the same states:
//!
//! | State | What happens | Leaves with |
//! |-------|--------------|-------------|
//! | **Normalizing** | Raw input becomes a [`VehicleQuery`](regula_domain::VehicleQuery) | `InvalidQuery` on malformed input |
//! | **InspectingHistory** | Attempt log is read; known failures short-circuit | `WrongEndpoint`, `RepeatedFailure`, or a cache hit |
//! | **Fetching** | The registry is called once | `ProviderFailure` on any failure |
//! | **Reconciling** | The attempt written for the fetch is read back | Result, with or without a log id |
//!
//! The engine never writes the attempt log. An invocation collaborator (see
//! `regula_provider::RecordingProvider`) appends entries independently, so the
//! read-back is bounded and best-effort.
//!
//! # Usage
//!
//! ```no_run
//! use regula_domain::{Endpoint, QueryKind};
//! use regula_provider::{HttpRegistryProvider, RecordingProvider};
//! use regula_resolver::{LookupSettings, ResolveRequest, Resolver, ResolverConfig};
//! use regula_store::SqliteAttemptStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig::default();
//! let store = Arc::new(SqliteAttemptStore::new("regula.db")?);
//! let http = HttpRegistryProvider::with_default_timeout("https://registry.example")?;
//! let provider = RecordingProvider::new(http, Arc::clone(&store));
//!
//! let resolver = Resolver::new(store, provider).with_config(&config);
//! let request = ResolveRequest::new(QueryKind::Chassis, "9BWZZZ377VT004251", Endpoint::Regional);
//! let result = resolver.resolve(&request, &LookupSettings::from_config(&config)).await?;
//! println!("cached: {}", result.from_cache);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use regula_resolver::ResolverConfig;
//!
//! // Default: 30-day TTL, one read-back after 1.5s
//! let config = ResolverConfig::default();
//!
//! // Uncached: every resolution goes to the registry
//! let config = ResolverConfig::uncached();
//!
//! // Patient: three read-backs, one second apart
//! let config = ResolverConfig::patient_readback();
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod memo;

pub use config::{ConfigError, ResolverConfig};
pub use engine::{Decision, LookupSettings, ReadbackPolicy, ResolveRequest, Resolver};
pub use error::ResolveError;
pub use memo::check_history;
