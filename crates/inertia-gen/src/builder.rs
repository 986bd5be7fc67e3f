//! Builds the N x N inertia-matrix subgraph.
//!
//! Layout of the result:
//!
//! ```text
//!            +-> row fn 1 ----------------+
//!  q --------+-> row fn 2 -> [widen] -----+-> concat (rows) -> M
//!            +-> row fn N ----------------+
//! ```
//!
//! Row `k` always lands on concatenation input `k - 1`. The subgraph is
//! built aside and swapped into the library only once it is complete, so a
//! missing row leaves the library exactly as it was.

use inertia_core::{finalize, Block, BlockKind, ConcatDimension, NodeId, Subgraph};
use inertia_storage::LibraryStore;
use serde::Serialize;

use crate::capabilities::Capabilities;
use crate::correction;
use crate::error::GenerateError;
use crate::rows::RowExpressionStore;
use crate::session::LibrarySession;

/// What [`build_inertia_subgraph`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InertiaSummary {
    pub subgraph: String,
    pub joints: usize,
    pub input: NodeId,
    pub output: NodeId,
    pub concat: NodeId,
    /// Row function ids; index `k - 1` holds row `k`.
    pub row_functions: Vec<NodeId>,
    /// Dimension-correction blocks inserted, by row.
    pub corrections: Vec<(usize, NodeId)>,
    pub terminators: usize,
    pub blocks: usize,
    pub wires: usize,
}

/// Builds subgraph `name` from rows `1..=joints` and stores it in the
/// session's library, replacing any previous subgraph of that name, then
/// persists.
pub fn build_inertia_subgraph<S: LibraryStore>(
    session: &mut LibrarySession<S>,
    name: &str,
    joints: usize,
    rows: &dyn RowExpressionStore,
    capabilities: Capabilities,
) -> Result<InertiaSummary, GenerateError> {
    let width = match u16::try_from(joints) {
        Ok(width) if width >= 1 => width,
        _ => return Err(GenerateError::InvalidJointCount { joints }),
    };

    let mut sg = Subgraph::new(name);
    let input = sg.add_block(Block::new(BlockKind::Input, "q"));
    let output = sg.add_block(Block::new(BlockKind::Output, "M"));
    let concat = sg.add_block(Block::new(
        BlockKind::Concatenate {
            dimension: ConcatDimension::Rows,
            arity: width,
        },
        "stack_rows",
    ));
    sg.connect(concat, 0, output, 0)?;

    let mut row_functions = Vec::with_capacity(joints);
    let mut corrections = Vec::new();
    for k in 1..=width {
        let row = k as usize;
        let expression = rows
            .lookup(row)
            .ok_or(GenerateError::RowExpressionMissing { row })?;

        if let Some(stale) = sg.row_function(row) {
            sg.remove_block(stale)?;
        }

        let row_fn = sg.add_block(Block::new(
            BlockKind::RowFunction {
                row,
                expression: expression.clone(),
            },
            expression.function.clone(),
        ));
        if let Some(fix) =
            correction::route_row(&mut sg, row_fn, &expression, concat, k - 1, width, capabilities)?
        {
            corrections.push((row, fix));
        }
        sg.connect(input, 0, row_fn, 0)?;
        row_functions.push(row_fn);
    }

    let report = finalize(&mut sg);
    sg.validate()?;

    let summary = InertiaSummary {
        subgraph: name.to_string(),
        joints,
        input,
        output,
        concat,
        row_functions,
        corrections,
        terminators: report.terminators_added,
        blocks: sg.node_count(),
        wires: sg.edge_count(),
    };
    tracing::info!(
        subgraph = name,
        joints,
        corrections = summary.corrections.len(),
        terminators = summary.terminators,
        "built inertia subgraph"
    );

    session.replace_subgraph(sg);
    session.persist()?;
    Ok(summary)
}
