//! The library editing session.
//!
//! A [`LibrarySession`] owns a store and the library loaded from it for the
//! duration of one run. Opening a session consumes the store, so there is no
//! hidden "currently open library" to reset: the previous session, if any,
//! has already given its store back through [`LibrarySession::finalize`] or
//! [`LibrarySession::abort`].
//!
//! Lock discipline is cooperative. Builders call [`unlock`](LibrarySession::unlock)
//! before editing and the session is re-locked on the way out, whether the
//! run succeeded or not.

use inertia_core::{Library, Subgraph};
use inertia_storage::{LibraryStore, StorageError};

use crate::error::GenerateError;

/// An open library plus the store it persists to.
pub struct LibrarySession<S: LibraryStore> {
    store: S,
    library: Library,
}

impl<S: LibraryStore> LibrarySession<S> {
    /// Opens the library in `store`, or creates and persists an empty locked
    /// library named `name` if the store holds none.
    ///
    /// Fails if the store cannot be read or written, or if it holds a library
    /// under a different name.
    pub fn open_or_create(mut store: S, name: &str) -> Result<Self, GenerateError> {
        let library = match store.load_library()? {
            Some(library) => {
                if library.name() != name {
                    return Err(StorageError::NameMismatch {
                        location: store.location(),
                        expected: name.to_string(),
                        found: library.name().to_string(),
                    }
                    .into());
                }
                tracing::info!(
                    library = name,
                    location = %store.location(),
                    subgraphs = library.subgraph_count(),
                    "opened library"
                );
                library
            }
            None => {
                let library = store.create_library(name)?;
                tracing::info!(library = name, location = %store.location(), "created library");
                library
            }
        };
        Ok(LibrarySession { store, library })
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_locked(&self) -> bool {
        self.library.is_locked()
    }

    /// Marks the library as being edited. Takes effect on disk at the next
    /// [`persist`](Self::persist).
    pub fn unlock(&mut self) {
        self.library.set_locked(false);
        tracing::debug!(library = self.library.name(), "unlocked");
    }

    /// Marks the library read-only. Takes effect on disk at the next
    /// [`persist`](Self::persist).
    pub fn lock(&mut self) {
        self.library.set_locked(true);
        tracing::debug!(library = self.library.name(), "locked");
    }

    /// Writes the whole library to the store in one transaction.
    pub fn persist(&mut self) -> Result<(), GenerateError> {
        self.store.save_library(&self.library)?;
        tracing::debug!(
            library = self.library.name(),
            subgraphs = self.library.subgraph_count(),
            locked = self.library.is_locked(),
            "persisted library"
        );
        Ok(())
    }

    /// Swaps `subgraph` in, deleting any subgraph of the same name. Returns
    /// the replaced subgraph.
    ///
    /// Editing a locked library is allowed but logged.
    pub fn replace_subgraph(&mut self, subgraph: Subgraph) -> Option<Subgraph> {
        if self.library.is_locked() {
            tracing::warn!(
                library = self.library.name(),
                subgraph = subgraph.name(),
                "editing a locked library"
            );
        }
        let name = subgraph.name().to_string();
        let previous = self.library.replace_subgraph(subgraph);
        tracing::info!(
            library = self.library.name(),
            subgraph = %name,
            replaced = previous.is_some(),
            "stored subgraph"
        );
        previous
    }

    /// Locks, persists, and closes the session, handing the store back.
    pub fn finalize(mut self) -> Result<S, GenerateError> {
        self.lock();
        self.persist()?;
        tracing::info!(library = self.library.name(), "finalized library");
        Ok(self.store)
    }

    /// Closes a failed session: re-locks and writes only the lock flag.
    ///
    /// Subgraph content is left at the last checkpoint, which is what the
    /// store already holds.
    pub fn abort(mut self) -> Result<S, GenerateError> {
        self.library.set_locked(true);
        self.store.set_locked(true)?;
        tracing::warn!(library = self.library.name(), "aborted run; library re-locked");
        Ok(self.store)
    }
}
