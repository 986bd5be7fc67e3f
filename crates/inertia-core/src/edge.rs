//! Wire type for subgraph edges.
//!
//! A [`Wire`] connects one block's numbered output port to another block's
//! numbered input port. Ports are 0-based: row `k` of the inertia matrix is
//! carried on concatenation input port `k - 1`.

use serde::{Deserialize, Serialize};

/// A directed connection from a source output port to a target input port.
///
/// The source and target blocks are the endpoints of the petgraph edge that
/// carries this weight; the wire itself only records which ports it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    /// Which output port of the source block.
    pub source_port: u16,
    /// Which input port of the target block.
    pub target_port: u16,
}

impl Wire {
    /// Creates a wire between the given ports.
    pub fn new(source_port: u16, target_port: u16) -> Self {
        Wire {
            source_port,
            target_port,
        }
    }

    /// Wire from output 0 to input 0, the common single-port case.
    pub fn direct() -> Self {
        Wire::new(0, 0)
    }
}
