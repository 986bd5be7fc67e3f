//! Subgraph: a named, wired block diagram.
//!
//! [`Subgraph`] is the unit the generator builds and the library stores. It
//! wraps a petgraph `StableGraph<Block, Wire>` so that [`NodeId`]s remain
//! valid when other blocks are removed, and it is the only place block and
//! wire mutations happen. Wiring is checked on insertion: ports must exist on
//! both ends and an input port accepts at most one driver.

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::edge::Wire;
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId};
use crate::node::{Block, BlockKind};

/// A named directed graph of blocks connected by wires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subgraph {
    name: String,
    graph: StableGraph<Block, Wire, Directed, u32>,
}

impl Subgraph {
    /// Creates an empty subgraph.
    pub fn new(name: impl Into<String>) -> Self {
        Subgraph {
            name: name.into(),
            graph: StableGraph::new(),
        }
    }

    /// Constructs a `Subgraph` from an already-built graph.
    ///
    /// Used by the storage layer to rebuild a subgraph from loaded rows
    /// without re-running the wiring checks.
    pub fn from_parts(name: String, graph: StableGraph<Block, Wire, Directed, u32>) -> Self {
        Subgraph { name, graph }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a read-only reference to the underlying graph.
    pub fn graph(&self) -> &StableGraph<Block, Wire, Directed, u32> {
        &self.graph
    }

    /// Returns the number of blocks.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of wires.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Looks up a block by ID.
    pub fn block(&self, id: NodeId) -> Option<&Block> {
        self.graph.node_weight(NodeIndex::from(id))
    }

    /// Looks up a block by ID (mutable, for the layout pass).
    pub fn block_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        self.graph.node_weight_mut(NodeIndex::from(id))
    }

    /// Returns all block IDs in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.graph.node_indices().map(NodeId::from).collect();
        ids.sort();
        ids
    }

    /// Returns the IDs of all blocks matching `predicate`, ascending.
    pub fn find_blocks(&self, predicate: impl Fn(&BlockKind) -> bool) -> Vec<NodeId> {
        self.node_ids()
            .into_iter()
            .filter(|&id| self.block(id).map_or(false, |b| predicate(&b.kind)))
            .collect()
    }

    /// Returns the row-function block producing matrix row `row`, if any.
    pub fn row_function(&self, row: usize) -> Option<NodeId> {
        self.find_blocks(|kind| matches!(kind, BlockKind::RowFunction { row: r, .. } if *r == row))
            .into_iter()
            .next()
    }

    /// Number of subgraph inports.
    pub fn inport_count(&self) -> usize {
        self.find_blocks(|k| matches!(k, BlockKind::Input)).len()
    }

    /// Number of subgraph outports.
    pub fn outport_count(&self) -> usize {
        self.find_blocks(|k| matches!(k, BlockKind::Output)).len()
    }

    /// Returns `(edge, target, wire)` for every wire leaving `id`.
    pub fn outgoing(&self, id: NodeId) -> Vec<(EdgeId, NodeId, Wire)> {
        let mut out: Vec<(EdgeId, NodeId, Wire)> = self
            .graph
            .edges_directed(NodeIndex::from(id), Direction::Outgoing)
            .map(|e| (EdgeId::from(e.id()), NodeId::from(e.target()), *e.weight()))
            .collect();
        out.sort_by_key(|(edge, _, _)| *edge);
        out
    }

    /// Returns `(edge, source, wire)` for every wire entering `id`.
    pub fn incoming(&self, id: NodeId) -> Vec<(EdgeId, NodeId, Wire)> {
        let mut incoming: Vec<(EdgeId, NodeId, Wire)> = self
            .graph
            .edges_directed(NodeIndex::from(id), Direction::Incoming)
            .map(|e| (EdgeId::from(e.id()), NodeId::from(e.source()), *e.weight()))
            .collect();
        incoming.sort_by_key(|(edge, _, _)| *edge);
        incoming
    }

    /// Returns the block driving input `port` of `id`, with the source port.
    pub fn driver_of(&self, id: NodeId, port: u16) -> Option<(NodeId, u16)> {
        self.incoming(id)
            .into_iter()
            .find(|(_, _, wire)| wire.target_port == port)
            .map(|(_, source, wire)| (source, wire.source_port))
    }

    /// Returns `true` if output `port` of `id` has at least one consumer.
    pub fn output_is_consumed(&self, id: NodeId, port: u16) -> bool {
        self.graph
            .edges_directed(NodeIndex::from(id), Direction::Outgoing)
            .any(|e| e.weight().source_port == port)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Adds a block and returns its ID.
    pub fn add_block(&mut self, block: Block) -> NodeId {
        NodeId::from(self.graph.add_node(block))
    }

    /// Removes a block and every wire attached to it.
    pub fn remove_block(&mut self, id: NodeId) -> Result<Block, CoreError> {
        self.graph
            .remove_node(NodeIndex::from(id))
            .ok_or(CoreError::NodeNotFound { id })
    }

    /// Wires output `source_port` of `from` to input `target_port` of `to`.
    ///
    /// Both blocks must exist, both ports must be in range, and the target
    /// input must not already be driven.
    pub fn connect(
        &mut self,
        from: NodeId,
        source_port: u16,
        to: NodeId,
        target_port: u16,
    ) -> Result<EdgeId, CoreError> {
        let source = self.block(from).ok_or(CoreError::NodeNotFound { id: from })?;
        if source_port >= source.output_ports() {
            return Err(CoreError::InvalidPort {
                label: source.label.clone(),
                direction: "output",
                port: source_port,
                available: source.output_ports(),
            });
        }
        let target = self.block(to).ok_or(CoreError::NodeNotFound { id: to })?;
        if target_port >= target.input_ports() {
            return Err(CoreError::InvalidPort {
                label: target.label.clone(),
                direction: "input",
                port: target_port,
                available: target.input_ports(),
            });
        }
        if self.driver_of(to, target_port).is_some() {
            return Err(CoreError::PortAlreadyDriven {
                label: target.label.clone(),
                port: target_port,
            });
        }

        let idx = self.graph.add_edge(
            NodeIndex::from(from),
            NodeIndex::from(to),
            Wire::new(source_port, target_port),
        );
        Ok(EdgeId::from(idx))
    }

    /// Removes a wire.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<Wire, CoreError> {
        self.graph
            .remove_edge(EdgeIndex::from(id))
            .ok_or(CoreError::EdgeNotFound { id })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Checks structural well-formedness.
    ///
    /// Every wire must use ports that exist on both ends, and every input
    /// port of every block must be driven by exactly one wire. Unconsumed
    /// outputs are allowed; the terminator pass caps them.
    pub fn validate(&self) -> Result<(), CoreError> {
        for edge in self.graph.edge_references() {
            let source = &self.graph[edge.source()];
            let target = &self.graph[edge.target()];
            let wire = edge.weight();
            if wire.source_port >= source.output_ports() {
                return Err(self.invalid(format!(
                    "wire {} leaves missing output port {} of '{}'",
                    edge.id().index(),
                    wire.source_port,
                    source.label
                )));
            }
            if wire.target_port >= target.input_ports() {
                return Err(self.invalid(format!(
                    "wire {} enters missing input port {} of '{}'",
                    edge.id().index(),
                    wire.target_port,
                    target.label
                )));
            }
        }

        for id in self.node_ids() {
            let block = &self.graph[NodeIndex::from(id)];
            let incoming = self.incoming(id);
            for port in 0..block.input_ports() {
                let drivers = incoming
                    .iter()
                    .filter(|(_, _, wire)| wire.target_port == port)
                    .count();
                match drivers {
                    1 => {}
                    0 => {
                        return Err(self.invalid(format!(
                            "input port {} of '{}' is unconnected",
                            port, block.label
                        )))
                    }
                    n => {
                        return Err(self.invalid(format!(
                            "input port {} of '{}' has {} drivers",
                            port, block.label, n
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> CoreError {
        CoreError::Invalid {
            subgraph: self.name.clone(),
            reason,
        }
    }
}
