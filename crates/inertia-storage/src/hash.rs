//! Deterministic structural fingerprints for subgraphs using blake3.
//!
//! Two subgraphs with the same fingerprint have the same name, the same
//! blocks (kind and label) under the same ids, and the same wires. Layout
//! positions are cosmetic and excluded. Fingerprints are derived state,
//! never stored in the database.
//!
//! # Determinism
//!
//! - Blocks are serialized with `serde_json::to_vec`; `BlockKind` contains no
//!   `HashMap`, so the bytes are canonical.
//! - Blocks are visited in ascending `NodeId` order, wires in ascending
//!   `(source, source_port, target, target_port)` order, so the result does
//!   not depend on edge index allocation.

use inertia_core::graph::Subgraph;
use inertia_core::library::Library;

use crate::convert::decompose;
use crate::error::StorageError;

/// Computes the structural fingerprint of one subgraph.
pub fn fingerprint_subgraph(subgraph: &Subgraph) -> Result<blake3::Hash, StorageError> {
    let decomposed = decompose(subgraph);
    let mut hasher = blake3::Hasher::new();

    hasher.update(decomposed.name.as_bytes());
    hasher.update(&(decomposed.blocks.len() as u64).to_le_bytes());
    for (id, block) in &decomposed.blocks {
        hasher.update(&id.0.to_le_bytes());
        hasher.update(&serde_json::to_vec(&block.kind)?);
        hasher.update(block.label.as_bytes());
        hasher.update(&[0]);
    }

    let mut wires: Vec<(u32, u16, u32, u16)> = decomposed
        .wires
        .iter()
        .map(|(_, source, target, wire)| (source.0, wire.source_port, target.0, wire.target_port))
        .collect();
    wires.sort();
    hasher.update(&(wires.len() as u64).to_le_bytes());
    for (source, source_port, target, target_port) in wires {
        hasher.update(&source.to_le_bytes());
        hasher.update(&source_port.to_le_bytes());
        hasher.update(&target.to_le_bytes());
        hasher.update(&target_port.to_le_bytes());
    }

    Ok(hasher.finalize())
}

/// Fingerprints every subgraph in library order.
pub fn fingerprint_library(library: &Library) -> Result<Vec<(String, blake3::Hash)>, StorageError> {
    library
        .subgraphs()
        .map(|sg| Ok((sg.name().to_string(), fingerprint_subgraph(sg)?)))
        .collect()
}
