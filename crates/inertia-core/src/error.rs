//! Core error types for inertia-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the subgraph data model.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

/// Core errors produced by the inertia-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found in the subgraph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// An edge id was not found in the subgraph.
    #[error("edge not found: EdgeId({id})", id = id.0)]
    EdgeNotFound { id: EdgeId },

    /// A wire referenced a port the block does not have.
    #[error("invalid port: block '{label}' has {available} {direction} port(s), got port {port}")]
    InvalidPort {
        label: String,
        direction: &'static str,
        port: u16,
        available: u16,
    },

    /// A second wire tried to drive an input port that already has a driver.
    #[error("input port {port} of block '{label}' is already driven")]
    PortAlreadyDriven { label: String, port: u16 },

    /// A subgraph failed structural validation.
    #[error("subgraph '{subgraph}' is invalid: {reason}")]
    Invalid { subgraph: String, reason: String },

    /// A subgraph with the given name does not exist in the library.
    #[error("subgraph not found: '{name}'")]
    SubgraphNotFound { name: String },
}
