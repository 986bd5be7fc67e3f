//! Error types for the generation pipeline.
//!
//! [`GenerateError`] is what every builder and [`regenerate`](crate::run::regenerate)
//! returns. Every variant is fatal for the run; name conflicts are never
//! errors because subgraphs are always deleted and rebuilt.

use std::path::PathBuf;

use inertia_core::CoreError;
use inertia_storage::StorageError;
use thiserror::Error;

/// Errors produced by a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The library container could not be opened, created or saved.
    #[error("container I/O error: {0}")]
    ContainerIo(#[from] StorageError),

    /// A required precomputed row expression was not found.
    #[error("row expression {row} is missing; derive the inertia rows before generating")]
    RowExpressionMissing { row: usize },

    /// A subgraph this one instantiates is absent or incomplete.
    #[error("missing dependency '{name}': {reason}")]
    MissingDependency { name: String, reason: String },

    /// The joint count is zero or too large for a concatenation block.
    #[error("invalid joint count {joints}: expected 1..={max}", max = u16::MAX)]
    InvalidJointCount { joints: usize },

    /// The row expression source could not be read.
    #[error(transparent)]
    RowStore(#[from] RowStoreError),

    /// The generator configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A graph mutation was rejected.
    #[error("graph error: {0}")]
    Graph(#[from] CoreError),
}

/// Errors loading a row expression file.
#[derive(Debug, Error)]
pub enum RowStoreError {
    #[error("failed to read row expressions from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse row expressions in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A key under `rows` is not a row index in `1..=joints`.
    #[error("invalid row index '{key}' in {path}")]
    InvalidRowIndex { path: PathBuf, key: String },
}

/// Errors loading or resolving the generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// An override held a value that could not be interpreted.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    /// A required setting was not provided and has no default.
    #[error("missing setting: {key}")]
    Missing { key: String },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}
