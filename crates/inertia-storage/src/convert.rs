//! Decompose/recompose conversions between Subgraph and flat storage rows.
//!
//! [`decompose`] breaks a Subgraph into a [`DecomposedSubgraph`] containing
//! flat vectors of blocks and wires. [`recompose`] rebuilds a Subgraph from a
//! DecomposedSubgraph, handling StableGraph index gaps so that stored
//! [`NodeId`]s and [`EdgeId`]s keep their values.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Directed;

use inertia_core::edge::Wire;
use inertia_core::graph::Subgraph;
use inertia_core::id::{EdgeId, NodeId};
use inertia_core::node::{Block, BlockKind};

use crate::error::StorageError;

/// A Subgraph broken into flat vectors for storage.
#[derive(Debug, Clone)]
pub struct DecomposedSubgraph {
    pub name: String,
    /// Blocks: (NodeId, Block), ascending by id.
    pub blocks: Vec<(NodeId, Block)>,
    /// Wires: (EdgeId, source, target, Wire), ascending by id.
    pub wires: Vec<(EdgeId, NodeId, NodeId, Wire)>,
}

/// Decomposes a Subgraph into flat vectors suitable for storage.
pub fn decompose(subgraph: &Subgraph) -> DecomposedSubgraph {
    let graph = subgraph.graph();

    let mut blocks: Vec<(NodeId, Block)> = graph
        .node_indices()
        .map(|idx| (NodeId::from(idx), graph[idx].clone()))
        .collect();
    blocks.sort_by_key(|(id, _)| *id);

    let mut wires: Vec<(EdgeId, NodeId, NodeId, Wire)> = graph
        .edge_references()
        .map(|edge_ref| {
            (
                EdgeId::from(edge_ref.id()),
                NodeId::from(edge_ref.source()),
                NodeId::from(edge_ref.target()),
                *edge_ref.weight(),
            )
        })
        .collect();
    wires.sort_by_key(|(id, _, _, _)| *id);

    DecomposedSubgraph {
        name: subgraph.name().to_string(),
        blocks,
        wires,
    }
}

/// Recomposes a Subgraph from a DecomposedSubgraph.
///
/// Handles StableGraph index gaps: if stored blocks have non-contiguous ids
/// (e.g., NodeId(0), NodeId(2), NodeId(5)), placeholder blocks are inserted
/// for the gaps and removed after the wires are added, preserving the id
/// mapping. Wires are treated the same way.
pub fn recompose(decomposed: DecomposedSubgraph) -> Result<Subgraph, StorageError> {
    let mut graph = StableGraph::<Block, Wire, Directed, u32>::new();

    let mut blocks = decomposed.blocks;
    blocks.sort_by_key(|(id, _)| *id);

    let Some(max_node) = blocks.last().map(|(id, _)| id.0) else {
        if !decomposed.wires.is_empty() {
            return Err(StorageError::ReconstructionError {
                reason: format!(
                    "subgraph '{}' has {} wire(s) but no blocks",
                    decomposed.name,
                    decomposed.wires.len()
                ),
            });
        }
        return Ok(Subgraph::from_parts(decomposed.name, graph));
    };

    let present: HashSet<u32> = blocks.iter().map(|(id, _)| id.0).collect();
    let mut by_id: HashMap<u32, Block> = blocks.into_iter().map(|(id, b)| (id.0, b)).collect();

    // Add blocks in order 0..=max_node, using placeholders for gaps.
    let mut gap_nodes = Vec::new();
    for i in 0..=max_node {
        match by_id.remove(&i) {
            Some(block) => {
                graph.add_node(block);
            }
            None => {
                graph.add_node(Block::new(BlockKind::Terminator, "__gap__"));
                gap_nodes.push(i);
            }
        }
    }

    let mut wires = decomposed.wires;
    wires.sort_by_key(|(id, _, _, _)| *id);
    for (id, source, target, _) in &wires {
        if !present.contains(&source.0) || !present.contains(&target.0) {
            return Err(StorageError::ReconstructionError {
                reason: format!(
                    "wire {} in subgraph '{}' references a missing block ({} -> {})",
                    id, decomposed.name, source, target
                ),
            });
        }
    }

    // Wires in a StableGraph may also have gaps; add placeholders the same way.
    if let Some(max_edge) = wires.last().map(|(id, _, _, _)| id.0) {
        let anchor = NodeIndex::<u32>::new(0);
        let mut by_edge: HashMap<u32, (NodeId, NodeId, Wire)> = wires
            .into_iter()
            .map(|(id, s, t, w)| (id.0, (s, t, w)))
            .collect();
        let mut gap_edges = Vec::new();
        for i in 0..=max_edge {
            match by_edge.remove(&i) {
                Some((source, target, wire)) => {
                    graph.add_edge(source.into(), target.into(), wire);
                }
                None => {
                    graph.add_edge(anchor, anchor, Wire::direct());
                    gap_edges.push(i);
                }
            }
        }
        for &gap in gap_edges.iter().rev() {
            graph.remove_edge(EdgeIndex::<u32>::new(gap as usize));
        }
    }

    // Remove placeholder blocks (in reverse order to preserve indices).
    for &gap in gap_nodes.iter().rev() {
        graph.remove_node(NodeIndex::<u32>::new(gap as usize));
    }

    Ok(Subgraph::from_parts(decomposed.name, graph))
}
