//! Sources of precomputed inertia rows.
//!
//! The generator only reads rows; deriving them is somebody else's job. A
//! [`RowExpressionStore`] declares the robot's joint count `N` and answers
//! "what is row `k`?" for `k` in `1..=N`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use inertia_core::RowExpression;
use serde::Deserialize;

use crate::error::RowStoreError;

/// Read-only lookup of row expressions by 1-based row index.
pub trait RowExpressionStore {
    /// Returns the expression for `row`, or `None` if it was never derived.
    fn lookup(&self, row: usize) -> Option<RowExpression>;

    /// Joint count of the robot the rows were derived for.
    ///
    /// Declared by the source, never inferred from which rows are present,
    /// so a missing row anywhere in `1..=N` is reported by the builder.
    fn joint_count(&self) -> usize;
}

/// Rows held in memory, keyed by index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRowStore {
    joints: usize,
    rows: BTreeMap<usize, RowExpression>,
}

impl InMemoryRowStore {
    /// An empty store for a robot with `joints` joints.
    pub fn new(joints: usize) -> Self {
        InMemoryRowStore {
            joints,
            rows: BTreeMap::new(),
        }
    }

    /// Builds a store where `rows[i]` becomes row `i + 1`. The joint count is
    /// the number of rows given; later removals do not change it.
    pub fn from_rows<I, R, E>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = E>,
        E: Into<String>,
    {
        let mut store = Self::default();
        for (i, entries) in rows.into_iter().enumerate() {
            store.insert(RowExpression::new(
                i + 1,
                entries.into_iter().map(Into::into).collect(),
            ));
            store.joints = i + 1;
        }
        store
    }

    /// Overrides the declared joint count.
    pub fn with_joints(mut self, joints: usize) -> Self {
        self.joints = joints;
        self
    }

    /// Adds or replaces the row at `expression.row`.
    pub fn insert(&mut self, expression: RowExpression) {
        self.rows.insert(expression.row, expression);
    }

    pub fn remove(&mut self, row: usize) -> Option<RowExpression> {
        self.rows.remove(&row)
    }
}

impl RowExpressionStore for InMemoryRowStore {
    fn lookup(&self, row: usize) -> Option<RowExpression> {
        self.rows.get(&row).cloned()
    }

    fn joint_count(&self) -> usize {
        self.joints
    }
}

/// On-disk layout of a row expression file.
#[derive(Debug, Deserialize)]
struct RowFile {
    robot: String,
    joints: usize,
    rows: BTreeMap<String, Vec<String>>,
}

/// Rows loaded from a JSON file of the form
/// `{ "robot": "planar2", "joints": 2, "rows": { "1": ["..", ".."], "2": [..] } }`.
///
/// `joints` is required. Row keys must lie in `1..=joints`.
#[derive(Debug, Clone)]
pub struct JsonRowStore {
    robot: String,
    path: PathBuf,
    rows: InMemoryRowStore,
}

impl JsonRowStore {
    /// Reads and parses the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RowStoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RowStoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Parses JSON text; `path` is only used in error messages.
    pub fn from_json(text: &str, path: impl AsRef<Path>) -> Result<Self, RowStoreError> {
        let path = path.as_ref();
        let file: RowFile = serde_json::from_str(text).map_err(|e| RowStoreError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut rows = InMemoryRowStore::new(file.joints);
        for (key, entries) in file.rows {
            let row = match key.trim().parse::<usize>() {
                Ok(row) if (1..=file.joints).contains(&row) => row,
                _ => {
                    return Err(RowStoreError::InvalidRowIndex {
                        path: path.to_path_buf(),
                        key,
                    })
                }
            };
            rows.insert(RowExpression::new(row, entries));
        }

        tracing::debug!(
            path = %path.display(),
            robot = %file.robot,
            joints = file.joints,
            "loaded row expressions"
        );
        Ok(JsonRowStore {
            robot: file.robot,
            path: path.to_path_buf(),
            rows,
        })
    }

    /// Robot model the rows were derived for.
    pub fn robot(&self) -> &str {
        &self.robot
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowExpressionStore for JsonRowStore {
    fn lookup(&self, row: usize) -> Option<RowExpression> {
        self.rows.lookup(row)
    }

    fn joint_count(&self) -> usize {
        self.rows.joint_count()
    }
}
