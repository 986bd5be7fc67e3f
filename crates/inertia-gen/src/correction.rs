//! Degenerate zero-row routing.
//!
//! With [`Capabilities::zero_row_collapse`] set, a row function whose row is
//! exactly all zeros emits a scalar instead of a 1xN row. [`route_row`] is
//! the one place that knows about this: it either wires the row function
//! straight into the row concatenation, or widens the scalar back to N
//! columns through a [`BlockKind::DimensionCorrection`] first.

use inertia_core::{Block, BlockKind, CoreError, NodeId, RowExpression, Subgraph};

use crate::capabilities::Capabilities;

/// Returns `true` if `expression` must be widened before concatenation.
pub fn needs_correction(expression: &RowExpression, width: u16, capabilities: Capabilities) -> bool {
    capabilities.zero_row_collapse && expression.is_zero_row(width as usize)
}

/// Connects `row_fn`'s output to input `port` of `concat`.
///
/// Returns the id of the inserted correction block, or `None` when the row
/// was wired directly.
pub fn route_row(
    subgraph: &mut Subgraph,
    row_fn: NodeId,
    expression: &RowExpression,
    concat: NodeId,
    port: u16,
    width: u16,
    capabilities: Capabilities,
) -> Result<Option<NodeId>, CoreError> {
    if !needs_correction(expression, width, capabilities) {
        subgraph.connect(row_fn, 0, concat, port)?;
        return Ok(None);
    }

    let fix = subgraph.add_block(Block::new(
        BlockKind::DimensionCorrection { arity: width },
        format!("{}_widen", expression.function),
    ));
    for input in 0..width {
        subgraph.connect(row_fn, 0, fix, input)?;
    }
    subgraph.connect(fix, 0, concat, port)?;

    tracing::debug!(
        subgraph = subgraph.name(),
        row = expression.row,
        width,
        "inserted dimension correction for zero row"
    );
    Ok(Some(fix))
}
