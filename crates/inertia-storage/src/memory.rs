//! In-memory implementation of [`LibraryStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and dry runs. It
//! keeps subgraphs in decomposed form, exactly as the SQLite backend stores
//! rows, so a loaded library never aliases the caller's in-memory state.

use inertia_core::graph::Subgraph;
use inertia_core::library::Library;

use crate::convert::{decompose, recompose, DecomposedSubgraph};
use crate::error::StorageError;
use crate::traits::LibraryStore;
use crate::types::SubgraphSummary;

/// Data stored for the library in the in-memory backend.
#[derive(Debug, Clone)]
struct StoredLibrary {
    name: String,
    locked: bool,
    /// Subgraphs in library order.
    subgraphs: Vec<DecomposedSubgraph>,
}

/// In-memory [`LibraryStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    library: Option<StoredLibrary>,
    /// Number of completed library-level writes.
    saves: usize,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `create_library`, `save_library` and `set_locked`
    /// calls so far. Lets tests count checkpoints.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn stored(&self) -> Result<&StoredLibrary, StorageError> {
        self.library.as_ref().ok_or_else(|| StorageError::LibraryNotFound {
            location: self.location(),
        })
    }

    fn stored_mut(&mut self) -> Result<&mut StoredLibrary, StorageError> {
        let location = self.location();
        self.library
            .as_mut()
            .ok_or(StorageError::LibraryNotFound { location })
    }
}

impl LibraryStore for InMemoryStore {
    fn location(&self) -> String {
        ":memory:".to_string()
    }

    fn create_library(&mut self, name: &str) -> Result<Library, StorageError> {
        if let Some(existing) = &self.library {
            return Err(StorageError::LibraryExists {
                name: existing.name.clone(),
                location: self.location(),
            });
        }
        let library = Library::new(name);
        self.library = Some(StoredLibrary {
            name: library.name().to_string(),
            locked: library.is_locked(),
            subgraphs: Vec::new(),
        });
        self.saves += 1;
        Ok(library)
    }

    fn load_library(&self) -> Result<Option<Library>, StorageError> {
        let Some(stored) = &self.library else {
            return Ok(None);
        };
        let subgraphs = stored
            .subgraphs
            .iter()
            .cloned()
            .map(recompose)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Library::from_parts(
            stored.name.clone(),
            stored.locked,
            subgraphs,
        )))
    }

    fn save_library(&mut self, library: &Library) -> Result<(), StorageError> {
        self.library = Some(StoredLibrary {
            name: library.name().to_string(),
            locked: library.is_locked(),
            subgraphs: library.subgraphs().map(decompose).collect(),
        });
        self.saves += 1;
        Ok(())
    }

    fn set_locked(&mut self, locked: bool) -> Result<(), StorageError> {
        self.stored_mut()?.locked = locked;
        self.saves += 1;
        Ok(())
    }

    fn load_subgraph(&self, name: &str) -> Result<Subgraph, StorageError> {
        let stored = self.stored()?;
        let decomposed = stored
            .subgraphs
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| StorageError::SubgraphNotFound(name.to_string()))?;
        recompose(decomposed)
    }

    fn list_subgraphs(&self) -> Result<Vec<SubgraphSummary>, StorageError> {
        let Some(stored) = &self.library else {
            return Ok(Vec::new());
        };
        Ok(stored
            .subgraphs
            .iter()
            .map(|s| SubgraphSummary {
                name: s.name.clone(),
                blocks: s.blocks.len(),
                wires: s.wires.len(),
            })
            .collect())
    }
}
