//! Regula Domain Layer
//!
//! Core value types and trait seams for the vehicle-lookup resolution engine.
//! Everything here is pure: no I/O, no clocks except where a caller asks for
//! "now", no infrastructure.
//!
//! ## Key Concepts
//!
//! - **VehicleQuery**: a normalized chassis / plate / renavam identifier
//! - **Endpoint**: one of the external registries a query can be resolved against
//! - **AttemptLog**: an immutable record of one past provider interaction
//! - **Freshness**: whether a successful attempt is still usable as a cached answer
//! - **ResolutionResult**: what the engine hands back to callers
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations (stores, providers) live in other crates
//! - Trait definitions for all external interactions live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attempt;
pub mod endpoint;
pub mod freshness;
pub mod inference;
pub mod query;
pub mod resolution;
pub mod traits;

// Re-exports for convenience
pub use attempt::{AttemptId, AttemptLog, AttemptOutcome, ErrorClass, ExtractedAttributes};
pub use endpoint::Endpoint;
pub use freshness::{is_fresh, is_fresh_at};
pub use inference::{KindInference, ShapeHeuristic};
pub use query::{InvalidQuery, QueryKind, QueryNormalizer, VehicleQuery};
pub use resolution::ResolutionResult;
