//! Terminator and layout pass run on every finished subgraph.
//!
//! [`finalize`] caps each output port that has no consumer with a
//! [`BlockKind::Terminator`], then assigns cosmetic positions. The pass is
//! idempotent: terminated ports are consumed, so a second run adds nothing,
//! and the layout never touches wires.

use std::collections::HashMap;

use petgraph::algo::toposort;

use crate::graph::Subgraph;
use crate::id::NodeId;
use crate::node::{Block, BlockKind, Position};

/// Horizontal distance between layout columns.
const COLUMN_SPACING: i32 = 200;
/// Vertical distance between blocks in one column.
const ROW_SPACING: i32 = 80;

/// Outcome of a [`finalize`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Terminators inserted by this run.
    pub terminators_added: usize,
    /// Whether positions were assigned. `false` when the graph is cyclic.
    pub laid_out: bool,
}

/// Terminates dangling outputs, then lays the subgraph out.
pub fn finalize(subgraph: &mut Subgraph) -> FinalizeReport {
    let terminators_added = terminate_dangling_outputs(subgraph);
    let laid_out = arrange(subgraph);
    FinalizeReport {
        terminators_added,
        laid_out,
    }
}

/// Attaches a terminator to every unconsumed output port. Returns how many
/// were added.
pub fn terminate_dangling_outputs(subgraph: &mut Subgraph) -> usize {
    let mut dangling: Vec<(NodeId, u16)> = Vec::new();
    for id in subgraph.node_ids() {
        let Some(block) = subgraph.block(id) else {
            continue;
        };
        for port in 0..block.output_ports() {
            if !subgraph.output_is_consumed(id, port) {
                dangling.push((id, port));
            }
        }
    }

    let mut added = 0;
    for (id, port) in dangling {
        let label = match subgraph.block(id) {
            Some(block) => format!("{}_term_{}", block.label, port),
            None => continue,
        };
        let term = subgraph.add_block(Block::new(BlockKind::Terminator, label));
        // Both ports exist and the fresh terminator has no driver yet.
        if subgraph.connect(id, port, term, 0).is_ok() {
            added += 1;
        } else {
            let _ = subgraph.remove_block(term);
        }
    }
    added
}

/// Places blocks in columns by longest-path depth from the sources, ordered
/// by id within a column. Cosmetic only; returns `false` and leaves positions
/// untouched if the graph has a cycle.
pub fn arrange(subgraph: &mut Subgraph) -> bool {
    let order = match toposort(subgraph.graph(), None) {
        Ok(order) => order,
        Err(_) => return false,
    };

    let mut depth: HashMap<NodeId, i32> = HashMap::new();
    for idx in order {
        let id = NodeId::from(idx);
        let d = subgraph
            .incoming(id)
            .iter()
            .filter_map(|(_, source, _)| depth.get(source).map(|d| d + 1))
            .max()
            .unwrap_or(0);
        depth.insert(id, d);
    }

    let mut rows_used: HashMap<i32, i32> = HashMap::new();
    for id in subgraph.node_ids() {
        let column = depth.get(&id).copied().unwrap_or(0);
        let row = rows_used.entry(column).or_insert(0);
        let position = Position {
            x: column * COLUMN_SPACING,
            y: *row * ROW_SPACING,
        };
        *row += 1;
        if let Some(block) = subgraph.block_mut(id) {
            block.position = position;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ConcatDimension;
    use proptest::prelude::*;

    fn all_outputs_consumed(sg: &Subgraph) -> bool {
        sg.node_ids().into_iter().all(|id| {
            let block = sg.block(id).unwrap();
            (0..block.output_ports()).all(|p| sg.output_is_consumed(id, p))
        })
    }

    #[test]
    fn caps_every_dangling_output() {
        let mut sg = Subgraph::new("dangling");
        let q = sg.add_block(Block::new(BlockKind::Input, "q"));
        let inv = sg.add_block(Block::new(BlockKind::Invert, "inv"));
        sg.connect(q, 0, inv, 0).unwrap();

        let report = finalize(&mut sg);

        assert_eq!(report.terminators_added, 1);
        assert!(all_outputs_consumed(&sg));
        let (_, target, _) = sg.outgoing(inv)[0];
        assert!(sg.block(target).unwrap().kind.is_terminator());
    }

    #[test]
    fn second_run_adds_nothing() {
        let mut sg = Subgraph::new("twice");
        sg.add_block(Block::new(BlockKind::Input, "a"));
        sg.add_block(Block::new(BlockKind::Input, "b"));

        assert_eq!(finalize(&mut sg).terminators_added, 2);
        let nodes = sg.node_count();
        let edges = sg.edge_count();

        assert_eq!(finalize(&mut sg).terminators_added, 0);
        assert_eq!(sg.node_count(), nodes);
        assert_eq!(sg.edge_count(), edges);
    }

    #[test]
    fn fully_wired_graph_gets_no_terminators() {
        let mut sg = Subgraph::new("wired");
        let q = sg.add_block(Block::new(BlockKind::Input, "q"));
        let out = sg.add_block(Block::new(BlockKind::Output, "y"));
        sg.connect(q, 0, out, 0).unwrap();

        assert_eq!(finalize(&mut sg).terminators_added, 0);
    }

    #[test]
    fn layout_columns_follow_depth() {
        let mut sg = Subgraph::new("layout");
        let q = sg.add_block(Block::new(BlockKind::Input, "q"));
        let concat = sg.add_block(Block::new(
            BlockKind::Concatenate {
                dimension: ConcatDimension::Rows,
                arity: 1,
            },
            "concat",
        ));
        let out = sg.add_block(Block::new(BlockKind::Output, "M"));
        sg.connect(q, 0, concat, 0).unwrap();
        sg.connect(concat, 0, out, 0).unwrap();

        let report = finalize(&mut sg);
        assert!(report.laid_out);
        assert_eq!(sg.block(q).unwrap().position.x, 0);
        assert_eq!(sg.block(concat).unwrap().position.x, COLUMN_SPACING);
        assert_eq!(sg.block(out).unwrap().position.x, 2 * COLUMN_SPACING);
    }

    #[test]
    fn layout_does_not_change_connectivity() {
        let mut sg = Subgraph::new("cosmetic");
        let q = sg.add_block(Block::new(BlockKind::Input, "q"));
        let out = sg.add_block(Block::new(BlockKind::Output, "y"));
        sg.connect(q, 0, out, 0).unwrap();

        let before: Vec<_> = sg.outgoing(q);
        arrange(&mut sg);
        assert_eq!(sg.outgoing(q), before);
        assert_eq!(sg.edge_count(), 1);
    }

    proptest! {
        #[test]
        fn finalize_is_idempotent_on_random_chains(
            inputs in 1usize..5,
            inverts in 0usize..5,
        ) {
            let mut sg = Subgraph::new("random");
            let mut tail = Vec::new();
            for i in 0..inputs {
                tail.push(sg.add_block(Block::new(BlockKind::Input, format!("in{}", i))));
            }
            for i in 0..inverts {
                let inv = sg.add_block(Block::new(BlockKind::Invert, format!("inv{}", i)));
                let src = tail[i % tail.len()];
                sg.connect(src, 0, inv, 0).unwrap();
                tail.push(inv);
            }

            finalize(&mut sg);
            prop_assert!(all_outputs_consumed(&sg));
            let nodes = sg.node_count();
            let edges = sg.edge_count();

            let again = finalize(&mut sg);
            prop_assert_eq!(again.terminators_added, 0);
            prop_assert_eq!(sg.node_count(), nodes);
            prop_assert_eq!(sg.edge_count(), edges);
        }
    }
}
