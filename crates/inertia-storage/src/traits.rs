//! The [`LibraryStore`] trait defining the storage contract for libraries.
//!
//! A store is bound to one location (a database file, or memory) and holds at
//! most one library. Two-layer API design:
//! - **Library-level** methods create, load and bulk-save the whole library.
//!   `save_library` is the checkpoint the generator calls after each subgraph.
//! - **Subgraph-level** methods inspect one subgraph, or list them all.
//!   Edits always go through `save_library` so a checkpoint is one write.
//!
//! All backends (InMemoryStore, SqliteStore) implement this trait, ensuring
//! they are fully swappable without changing generator logic.

use inertia_core::graph::Subgraph;
use inertia_core::library::Library;

use crate::error::StorageError;
use crate::types::SubgraphSummary;

/// The storage contract for block libraries.
///
/// The trait is synchronous: generation runs are single-threaded and
/// strictly sequential.
pub trait LibraryStore {
    /// Human-readable location of the backing artifact, for logs and errors.
    fn location(&self) -> String;

    // -------------------------------------------------------------------
    // Library-level operations
    // -------------------------------------------------------------------

    /// Creates a new empty, locked library and persists it immediately.
    ///
    /// Fails with [`StorageError::LibraryExists`] if the store already holds
    /// one.
    fn create_library(&mut self, name: &str) -> Result<Library, StorageError>;

    /// Loads the stored library, or `None` if the store is empty.
    fn load_library(&self) -> Result<Option<Library>, StorageError>;

    /// Bulk save/overwrite of the whole library: name, lock flag, and every
    /// subgraph. Subgraphs no longer present in `library` are deleted.
    fn save_library(&mut self, library: &Library) -> Result<(), StorageError>;

    /// Updates only the stored lock flag.
    fn set_locked(&mut self, locked: bool) -> Result<(), StorageError>;

    // -------------------------------------------------------------------
    // Subgraph-level operations
    // -------------------------------------------------------------------

    /// Loads one subgraph by name.
    fn load_subgraph(&self, name: &str) -> Result<Subgraph, StorageError>;

    /// Lists stored subgraphs in library order.
    fn list_subgraphs(&self) -> Result<Vec<SubgraphSummary>, StorageError>;
}

/// A mutable borrow of a store is itself a store, so a session can run
/// against a store the caller keeps ownership of.
impl<S: LibraryStore + ?Sized> LibraryStore for &mut S {
    fn location(&self) -> String {
        (**self).location()
    }

    fn create_library(&mut self, name: &str) -> Result<Library, StorageError> {
        (**self).create_library(name)
    }

    fn load_library(&self) -> Result<Option<Library>, StorageError> {
        (**self).load_library()
    }

    fn save_library(&mut self, library: &Library) -> Result<(), StorageError> {
        (**self).save_library(library)
    }

    fn set_locked(&mut self, locked: bool) -> Result<(), StorageError> {
        (**self).set_locked(locked)
    }

    fn load_subgraph(&self, name: &str) -> Result<Subgraph, StorageError> {
        (**self).load_subgraph(name)
    }

    fn list_subgraphs(&self) -> Result<Vec<SubgraphSummary>, StorageError> {
        (**self).list_subgraphs()
    }
}
