//! Inertia-matrix block generation.
//!
//! Assembles precomputed symbolic rows into an N x N inertia-matrix subgraph,
//! composes a second subgraph that inverts it, and persists both into a
//! lockable block library so the run can be repeated safely.
//!
//! # Modules
//!
//! - [`error`]: GenerateError, RowStoreError and ConfigError
//! - [`rows`]: RowExpressionStore trait with in-memory and JSON backends
//! - [`capabilities`]: environment quirks resolved once per run
//! - [`session`]: LibrarySession, the open/unlock/persist/lock lifecycle
//! - [`builder`]: the inertia-matrix subgraph builder
//! - [`correction`]: degenerate zero-row routing
//! - [`inverse`]: the inverse-inertia subgraph composer
//! - [`config`]: GeneratorConfig loading and overrides
//! - [`run`]: the full `regenerate` pipeline

pub mod builder;
pub mod capabilities;
pub mod config;
pub mod correction;
pub mod error;
pub mod inverse;
pub mod rows;
pub mod run;
pub mod session;

pub use builder::{build_inertia_subgraph, InertiaSummary};
pub use capabilities::Capabilities;
pub use config::GeneratorConfig;
pub use error::{ConfigError, GenerateError, RowStoreError};
pub use inverse::{build_inverse_subgraph, InverseSummary};
pub use rows::{InMemoryRowStore, JsonRowStore, RowExpressionStore};
pub use run::{regenerate, RunSummary};
pub use session::LibrarySession;
