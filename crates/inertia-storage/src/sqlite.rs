//! SQLite implementation of [`LibraryStore`].
//!
//! [`SqliteStore`] persists a block library in a single SQLite database file
//! with WAL mode, atomic transactions on every write, and automatic schema
//! migrations. Block kinds are stored as JSON TEXT columns via serde_json.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use inertia_core::edge::Wire;
use inertia_core::graph::Subgraph;
use inertia_core::id::{EdgeId, NodeId};
use inertia_core::library::Library;
use inertia_core::node::{Block, BlockKind, Position};

use crate::convert::{decompose, recompose, DecomposedSubgraph};
use crate::error::StorageError;
use crate::traits::LibraryStore;
use crate::types::SubgraphSummary;

/// SQLite-backed implementation of [`LibraryStore`].
///
/// Every write operation is wrapped in a transaction for atomicity.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    ///
    /// A path that does not exist yet is created. An unwritable location or
    /// a file that is not a library database is an error.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = crate::schema::open_database(path)?;
        tracing::debug!(path = %path.display(), "opened library database");
        Ok(SqliteStore {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn, path: None })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Reads the library row, if any.
    fn library_row(&self) -> Result<Option<(String, bool)>, StorageError> {
        let row = self
            .conn
            .query_row("SELECT name, locked FROM library WHERE id = 1", [], |row| {
                let name: String = row.get(0)?;
                let locked: i32 = row.get(1)?;
                Ok((name, locked != 0))
            })
            .optional()?;
        Ok(row)
    }

    /// Inserts one decomposed subgraph at library position `ordinal`.
    fn insert_subgraph_rows(
        tx: &Transaction<'_>,
        decomposed: &DecomposedSubgraph,
        ordinal: i64,
    ) -> Result<(), StorageError> {
        tx.execute(
            "INSERT INTO subgraphs (name, ordinal) VALUES (?1, ?2)",
            params![decomposed.name, ordinal],
        )?;
        let subgraph_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO blocks (subgraph_id, node_id, label, kind_json, pos_x, pos_y) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (node_id, block) in &decomposed.blocks {
                let kind_json = serde_json::to_string(&block.kind)?;
                stmt.execute(params![
                    subgraph_id,
                    node_id.0,
                    block.label,
                    kind_json,
                    block.position.x,
                    block.position.y,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO wires (subgraph_id, edge_id, source_id, source_port, target_id, target_port) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (edge_id, source, target, wire) in &decomposed.wires {
                stmt.execute(params![
                    subgraph_id,
                    edge_id.0,
                    source.0,
                    wire.source_port,
                    target.0,
                    wire.target_port,
                ])?;
            }
        }
        Ok(())
    }

    /// Loads one subgraph's rows by its row id.
    fn load_decomposed(&self, id: i64, name: String) -> Result<DecomposedSubgraph, StorageError> {
        let blocks: Vec<(NodeId, Block)> = {
            let mut stmt = self.conn.prepare_cached(
                "SELECT node_id, label, kind_json, pos_x, pos_y FROM blocks WHERE subgraph_id = ?1 ORDER BY node_id",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                let node_id: u32 = row.get(0)?;
                let label: String = row.get(1)?;
                let kind_json: String = row.get(2)?;
                let x: i32 = row.get(3)?;
                let y: i32 = row.get(4)?;
                Ok((node_id, label, kind_json, x, y))
            })?;
            let mut result = Vec::new();
            for row in rows {
                let (node_id, label, kind_json, x, y) = row?;
                let kind: BlockKind = serde_json::from_str(&kind_json)?;
                result.push((
                    NodeId(node_id),
                    Block {
                        kind,
                        label,
                        position: Position { x, y },
                    },
                ));
            }
            result
        };

        let wires: Vec<(EdgeId, NodeId, NodeId, Wire)> = {
            let mut stmt = self.conn.prepare_cached(
                "SELECT edge_id, source_id, source_port, target_id, target_port FROM wires WHERE subgraph_id = ?1 ORDER BY edge_id",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                let edge_id: u32 = row.get(0)?;
                let source_id: u32 = row.get(1)?;
                let source_port: u16 = row.get(2)?;
                let target_id: u32 = row.get(3)?;
                let target_port: u16 = row.get(4)?;
                Ok((
                    EdgeId(edge_id),
                    NodeId(source_id),
                    NodeId(target_id),
                    Wire::new(source_port, target_port),
                ))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(DecomposedSubgraph {
            name,
            blocks,
            wires,
        })
    }

    /// Subgraph row ids and names in library order.
    fn subgraph_rows(&self) -> Result<Vec<(i64, String)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM subgraphs ORDER BY ordinal, id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl LibraryStore for SqliteStore {
    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }

    fn create_library(&mut self, name: &str) -> Result<Library, StorageError> {
        if let Some((existing, _)) = self.library_row()? {
            return Err(StorageError::LibraryExists {
                name: existing,
                location: self.location(),
            });
        }
        let library = Library::new(name);
        self.conn.execute(
            "INSERT INTO library (id, name, locked) VALUES (1, ?1, ?2)",
            params![library.name(), library.is_locked() as i32],
        )?;
        Ok(library)
    }

    fn load_library(&self) -> Result<Option<Library>, StorageError> {
        let Some((name, locked)) = self.library_row()? else {
            return Ok(None);
        };
        let mut subgraphs = Vec::new();
        for (id, sg_name) in self.subgraph_rows()? {
            subgraphs.push(recompose(self.load_decomposed(id, sg_name)?)?);
        }
        Ok(Some(Library::from_parts(name, locked, subgraphs)))
    }

    fn save_library(&mut self, library: &Library) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO library (id, name, locked) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, locked = excluded.locked",
            params![library.name(), library.is_locked() as i32],
        )?;

        // Full overwrite: child tables first to respect foreign key ordering.
        tx.execute("DELETE FROM wires", [])?;
        tx.execute("DELETE FROM blocks", [])?;
        tx.execute("DELETE FROM subgraphs", [])?;

        for (ordinal, subgraph) in library.subgraphs().enumerate() {
            Self::insert_subgraph_rows(&tx, &decompose(subgraph), ordinal as i64)?;
        }

        tx.commit()?;
        tracing::debug!(
            location = %self.location(),
            subgraphs = library.subgraph_count(),
            locked = library.is_locked(),
            "saved library"
        );
        Ok(())
    }

    fn set_locked(&mut self, locked: bool) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "UPDATE library SET locked = ?1 WHERE id = 1",
            params![locked as i32],
        )?;
        if changed == 0 {
            return Err(StorageError::LibraryNotFound {
                location: self.location(),
            });
        }
        Ok(())
    }

    fn load_subgraph(&self, name: &str) -> Result<Subgraph, StorageError> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM subgraphs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let id = id.ok_or_else(|| StorageError::SubgraphNotFound(name.to_string()))?;
        recompose(self.load_decomposed(id, name.to_string())?)
    }

    fn list_subgraphs(&self) -> Result<Vec<SubgraphSummary>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT s.name,
                    (SELECT COUNT(*) FROM blocks b WHERE b.subgraph_id = s.id),
                    (SELECT COUNT(*) FROM wires w WHERE w.subgraph_id = s.id)
             FROM subgraphs s ORDER BY s.ordinal, s.id",
        )?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let blocks: i64 = row.get(1)?;
            let wires: i64 = row.get(2)?;
            Ok(SubgraphSummary {
                name,
                blocks: blocks as usize,
                wires: wires as usize,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
