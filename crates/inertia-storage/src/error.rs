//! Storage error types for inertia-storage.
//!
//! [`StorageError`] covers all anticipated failure modes in the storage layer:
//! the SQLite backend, schema migration, serialization, missing entities
//! and reconstruction failures.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The SQLite backend failed (unwritable path, corrupt file, disk error).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store holds no library yet.
    #[error("no library stored at {location}")]
    LibraryNotFound { location: String },

    /// The store already holds a library.
    #[error("library '{name}' already exists at {location}")]
    LibraryExists { name: String, location: String },

    /// The stored library has a different name than the one requested.
    #[error("library name mismatch at {location}: expected '{expected}', found '{found}'")]
    NameMismatch {
        location: String,
        expected: String,
        found: String,
    },

    /// A subgraph with the given name was not found.
    #[error("subgraph not found: '{0}'")]
    SubgraphNotFound(String),

    /// Failed to reconstruct a Subgraph from stored data.
    #[error("reconstruction error: {reason}")]
    ReconstructionError { reason: String },
}
