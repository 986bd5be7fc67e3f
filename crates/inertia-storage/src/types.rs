//! Storage-layer types for listing stored subgraphs.

use serde::{Deserialize, Serialize};

/// Summary of a stored subgraph (for listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphSummary {
    /// Subgraph name, unique within the library.
    pub name: String,
    /// Number of stored blocks.
    pub blocks: usize,
    /// Number of stored wires.
    pub wires: usize,
}
