//! Block types for subgraph nodes.
//!
//! Every node in a [`Subgraph`](crate::graph::Subgraph) is a [`Block`]: a
//! [`BlockKind`] that fixes the node's semantics and port counts, plus a
//! display label and a cosmetic layout position.

use serde::{Deserialize, Serialize};

use crate::expr::RowExpression;

// ---------------------------------------------------------------------------
// Block kinds
// ---------------------------------------------------------------------------

/// The dimension a concatenation block stacks its inputs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcatDimension {
    /// Inputs become consecutive rows of the result (vertical stacking).
    Rows,
    /// Inputs become consecutive columns of the result (horizontal stacking).
    Columns,
}

/// The operation a block performs.
///
/// Port counts are derived from the kind; see [`BlockKind::input_ports`] and
/// [`BlockKind::output_ports`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Subgraph inport. No inputs, one output.
    Input,
    /// Subgraph outport. One input, no outputs.
    Output,
    /// Evaluates one precomputed row of the inertia matrix from the full
    /// coordinate vector. One input, one output (a 1xN row).
    RowFunction {
        /// 1-based matrix row this function produces.
        row: usize,
        /// The symbolic row this block evaluates.
        expression: RowExpression,
    },
    /// Stacks `arity` inputs into one matrix along `dimension`.
    Concatenate {
        dimension: ConcatDimension,
        arity: u16,
    },
    /// Replicates a collapsed scalar back into a 1xN row. Always stacks
    /// columns; all `arity` inputs are fed by the same scalar.
    DimensionCorrection { arity: u16 },
    /// Opaque square-matrix inverse. One input, one output.
    Invert,
    /// A reference to another subgraph in the same library, by name.
    /// Port counts mirror the referenced subgraph's inports/outports.
    SubgraphInstance {
        subgraph: String,
        inputs: u16,
        outputs: u16,
    },
    /// No-op sink capping an otherwise unconsumed output. One input.
    Terminator,
}

impl BlockKind {
    /// Number of input ports this kind exposes.
    pub fn input_ports(&self) -> u16 {
        match self {
            BlockKind::Input => 0,
            BlockKind::Output => 1,
            BlockKind::RowFunction { .. } => 1,
            BlockKind::Concatenate { arity, .. } => *arity,
            BlockKind::DimensionCorrection { arity } => *arity,
            BlockKind::Invert => 1,
            BlockKind::SubgraphInstance { inputs, .. } => *inputs,
            BlockKind::Terminator => 1,
        }
    }

    /// Number of output ports this kind exposes.
    pub fn output_ports(&self) -> u16 {
        match self {
            BlockKind::Input => 1,
            BlockKind::Output => 0,
            BlockKind::RowFunction { .. } => 1,
            BlockKind::Concatenate { .. } => 1,
            BlockKind::DimensionCorrection { .. } => 1,
            BlockKind::Invert => 1,
            BlockKind::SubgraphInstance { outputs, .. } => *outputs,
            BlockKind::Terminator => 0,
        }
    }

    /// Returns `true` for sink blocks inserted by the terminator pass.
    pub fn is_terminator(&self) -> bool {
        matches!(self, BlockKind::Terminator)
    }

    /// Short, stable name of the variant, used in labels and log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Input => "Inport",
            BlockKind::Output => "Outport",
            BlockKind::RowFunction { .. } => "RowFunction",
            BlockKind::Concatenate { .. } => "Concatenate",
            BlockKind::DimensionCorrection { .. } => "DimensionCorrection",
            BlockKind::Invert => "Invert",
            BlockKind::SubgraphInstance { .. } => "SubgraphInstance",
            BlockKind::Terminator => "Terminator",
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Cosmetic canvas position, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A node in a subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// What the block computes.
    pub kind: BlockKind,
    /// Human-readable label; not used for addressing.
    pub label: String,
    /// Layout position assigned by the layout pass.
    #[serde(default)]
    pub position: Position,
}

impl Block {
    /// Creates a block at the origin.
    pub fn new(kind: BlockKind, label: impl Into<String>) -> Self {
        Block {
            kind,
            label: label.into(),
            position: Position::default(),
        }
    }

    pub fn input_ports(&self) -> u16 {
        self.kind.input_ports()
    }

    pub fn output_ports(&self) -> u16 {
        self.kind.output_ports()
    }
}
