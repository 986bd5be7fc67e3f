//! Storage abstraction for block libraries.
//!
//! Provides the [`LibraryStore`] trait defining the storage contract that all
//! backends implement, plus the [`InMemoryStore`] and [`SqliteStore`] as
//! first-class backends.
//!
//! # Architecture
//!
//! A store holds at most one [`Library`](inertia_core::Library). The API has
//! two layers:
//! - **Library-level** methods (`create_library`, `load_library`,
//!   `save_library`, `set_locked`) used by the generator's session.
//! - **Subgraph-level** read methods (`load_subgraph`, `list_subgraphs`)
//!   used by the CLI for inspection.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: SubgraphSummary storage-layer type
//! - [`traits`]: LibraryStore trait definition
//! - [`convert`]: Subgraph decompose/recompose functions
//! - [`hash`]: blake3 structural fingerprints
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: SQL schema constants and migration setup
//! - [`sqlite`]: SqliteStore implementation

pub mod convert;
pub mod error;
pub mod hash;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use hash::{fingerprint_library, fingerprint_subgraph};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::LibraryStore;
pub use types::SubgraphSummary;
