//! Library: the named collection of subgraphs a generation run edits.
//!
//! A [`Library`] owns its subgraphs exclusively and holds at most one
//! subgraph per name. Regeneration goes through [`Library::replace_subgraph`],
//! which deletes any previous subgraph of the same name before inserting the
//! new one, so repeated runs never accumulate duplicates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::Subgraph;
use crate::node::BlockKind;

/// A named, lockable collection of subgraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    name: String,
    locked: bool,
    /// Subgraphs in insertion order, keyed by name.
    subgraphs: IndexMap<String, Subgraph>,
}

impl Library {
    /// Creates an empty, locked library.
    pub fn new(name: impl Into<String>) -> Self {
        Library {
            name: name.into(),
            locked: true,
            subgraphs: IndexMap::new(),
        }
    }

    /// Constructs a `Library` from stored parts.
    pub fn from_parts(name: String, locked: bool, subgraphs: Vec<Subgraph>) -> Self {
        let subgraphs = subgraphs
            .into_iter()
            .map(|sg| (sg.name().to_string(), sg))
            .collect();
        Library {
            name,
            locked,
            subgraphs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Looks up a subgraph by name.
    pub fn subgraph(&self, name: &str) -> Option<&Subgraph> {
        self.subgraphs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.subgraphs.contains_key(name)
    }

    /// Subgraph names in insertion order.
    pub fn subgraph_names(&self) -> Vec<&str> {
        self.subgraphs.keys().map(String::as_str).collect()
    }

    /// Iterates subgraphs in insertion order.
    pub fn subgraphs(&self) -> impl Iterator<Item = &Subgraph> {
        self.subgraphs.values()
    }

    pub fn subgraph_count(&self) -> usize {
        self.subgraphs.len()
    }

    /// Deletes any subgraph with the same name, then inserts `subgraph`.
    ///
    /// Returns the subgraph that was replaced, if there was one.
    pub fn replace_subgraph(&mut self, subgraph: Subgraph) -> Option<Subgraph> {
        let previous = self.subgraphs.shift_remove(subgraph.name());
        self.subgraphs
            .insert(subgraph.name().to_string(), subgraph);
        previous
    }

    /// Deletes a subgraph by name.
    pub fn remove_subgraph(&mut self, name: &str) -> Result<Subgraph, CoreError> {
        self.subgraphs
            .shift_remove(name)
            .ok_or_else(|| CoreError::SubgraphNotFound {
                name: name.to_string(),
            })
    }

    /// Validates every subgraph, then checks that each
    /// [`BlockKind::SubgraphInstance`] names a subgraph in this library whose
    /// inport/outport counts match the instance's ports.
    pub fn validate(&self) -> Result<(), CoreError> {
        for subgraph in self.subgraphs.values() {
            subgraph.validate()?;
        }
        for subgraph in self.subgraphs.values() {
            for id in subgraph.node_ids() {
                let Some(block) = subgraph.block(id) else {
                    continue;
                };
                let BlockKind::SubgraphInstance {
                    subgraph: target,
                    inputs,
                    outputs,
                } = &block.kind
                else {
                    continue;
                };
                let Some(referenced) = self.subgraphs.get(target) else {
                    return Err(CoreError::Invalid {
                        subgraph: subgraph.name().to_string(),
                        reason: format!(
                            "block '{}' references missing subgraph '{}'",
                            block.label, target
                        ),
                    });
                };
                if referenced.inport_count() != *inputs as usize
                    || referenced.outport_count() != *outputs as usize
                {
                    return Err(CoreError::Invalid {
                        subgraph: subgraph.name().to_string(),
                        reason: format!(
                            "block '{}' expects {} in / {} out, '{}' has {} / {}",
                            block.label,
                            inputs,
                            outputs,
                            target,
                            referenced.inport_count(),
                            referenced.outport_count()
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
