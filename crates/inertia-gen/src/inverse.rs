//! Builds the inverse-inertia subgraph on top of an existing inertia block.
//!
//! `q -> [inertia instance] -> inv -> Minv`

use inertia_core::{finalize, Block, BlockKind, NodeId, Subgraph};
use inertia_storage::LibraryStore;
use serde::Serialize;

use crate::error::GenerateError;
use crate::session::LibrarySession;

/// What [`build_inverse_subgraph`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InverseSummary {
    pub subgraph: String,
    /// Name of the instantiated inertia subgraph.
    pub instance_of: String,
    pub input: NodeId,
    pub instance: NodeId,
    pub invert: NodeId,
    pub output: NodeId,
    pub terminators: usize,
    pub blocks: usize,
    pub wires: usize,
}

/// Builds subgraph `name` as an inverted instance of `inertia_name` and
/// stores it, replacing any previous subgraph of that name, then persists.
///
/// `inertia_name` must already be in the library, structurally valid, and
/// expose exactly one inport and one outport; otherwise the library is left
/// untouched and [`GenerateError::MissingDependency`] is returned.
pub fn build_inverse_subgraph<S: LibraryStore>(
    session: &mut LibrarySession<S>,
    name: &str,
    inertia_name: &str,
) -> Result<InverseSummary, GenerateError> {
    let missing = |reason: String| GenerateError::MissingDependency {
        name: inertia_name.to_string(),
        reason,
    };

    let referenced = session.library().subgraph(inertia_name).ok_or_else(|| {
        missing(format!(
            "not present in library '{}'; build it first",
            session.library().name()
        ))
    })?;
    referenced
        .validate()
        .map_err(|e| missing(format!("incomplete: {e}")))?;
    let (inports, outports) = (referenced.inport_count(), referenced.outport_count());
    if inports != 1 || outports != 1 {
        return Err(missing(format!(
            "expected 1 inport and 1 outport, found {inports} and {outports}"
        )));
    }

    let mut sg = Subgraph::new(name);
    let input = sg.add_block(Block::new(BlockKind::Input, "q"));
    let instance = sg.add_block(Block::new(
        BlockKind::SubgraphInstance {
            subgraph: inertia_name.to_string(),
            inputs: 1,
            outputs: 1,
        },
        inertia_name,
    ));
    let invert = sg.add_block(Block::new(BlockKind::Invert, "invert"));
    let output = sg.add_block(Block::new(BlockKind::Output, "Minv"));

    sg.connect(input, 0, instance, 0)?;
    sg.connect(instance, 0, invert, 0)?;
    sg.connect(invert, 0, output, 0)?;

    let report = finalize(&mut sg);
    sg.validate()?;

    let summary = InverseSummary {
        subgraph: name.to_string(),
        instance_of: inertia_name.to_string(),
        input,
        instance,
        invert,
        output,
        terminators: report.terminators_added,
        blocks: sg.node_count(),
        wires: sg.edge_count(),
    };
    tracing::info!(subgraph = name, instance_of = inertia_name, "built inverse subgraph");

    session.replace_subgraph(sg);
    session.persist()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_inertia_subgraph;
    use crate::capabilities::Capabilities;
    use crate::rows::InMemoryRowStore;
    use inertia_storage::InMemoryStore;

    #[test]
    fn chains_instance_through_invert() {
        let mut store = InMemoryStore::new();
        let mut session = LibrarySession::open_or_create(&mut store, "lib").unwrap();
        session.unlock();
        let rows = InMemoryRowStore::from_rows([["a", "b"], ["c", "d"]]);
        build_inertia_subgraph(&mut session, "M", 2, &rows, Capabilities::default()).unwrap();

        let summary = build_inverse_subgraph(&mut session, "Minv", "M").unwrap();
        let sg = session.library().subgraph("Minv").unwrap();

        assert_eq!(sg.driver_of(summary.instance, 0), Some((summary.input, 0)));
        assert_eq!(sg.driver_of(summary.invert, 0), Some((summary.instance, 0)));
        assert_eq!(sg.driver_of(summary.output, 0), Some((summary.invert, 0)));
        assert_eq!(summary.blocks, 4);
        assert_eq!(summary.terminators, 0);
        session.library().validate().unwrap();
    }

    #[test]
    fn absent_dependency_is_reported() {
        let mut store = InMemoryStore::new();
        let mut session = LibrarySession::open_or_create(&mut store, "lib").unwrap();
        session.unlock();

        match build_inverse_subgraph(&mut session, "Minv", "M") {
            Err(GenerateError::MissingDependency { name, .. }) => assert_eq!(name, "M"),
            other => panic!("expected MissingDependency, got {other:?}"),
        }
        assert_eq!(session.library().subgraph_count(), 0);
    }

    #[test]
    fn invalid_dependency_is_reported() {
        let mut store = InMemoryStore::new();
        let mut session = LibrarySession::open_or_create(&mut store, "lib").unwrap();
        session.unlock();
        let mut broken = Subgraph::new("M");
        broken.add_block(Block::new(BlockKind::Input, "q"));
        broken.add_block(Block::new(BlockKind::Output, "M"));
        session.replace_subgraph(broken);

        match build_inverse_subgraph(&mut session, "Minv", "M") {
            Err(GenerateError::MissingDependency { reason, .. }) => {
                assert!(reason.contains("incomplete"), "{reason}")
            }
            other => panic!("expected MissingDependency, got {other:?}"),
        }
        assert!(!session.library().contains("Minv"));
    }
}
