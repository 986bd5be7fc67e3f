//! End-to-end tests for the regeneration pipeline.

use inertia_core::{BlockKind, ConcatDimension, Library, NodeId, Subgraph};
use inertia_gen::{
    build_inertia_subgraph, build_inverse_subgraph, regenerate, Capabilities, GenerateError,
    GeneratorConfig, InMemoryRowStore, JsonRowStore, LibrarySession,
};
use inertia_storage::{
    fingerprint_library, InMemoryStore, LibraryStore, SqliteStore, StorageError, SubgraphSummary,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Wraps an [`InMemoryStore`] and records the lock flag of every bulk save.
#[derive(Default)]
struct RecordingStore {
    inner: InMemoryStore,
    saved_lock_states: Vec<bool>,
}

impl LibraryStore for RecordingStore {
    fn location(&self) -> String {
        self.inner.location()
    }
    fn create_library(&mut self, name: &str) -> Result<Library, StorageError> {
        self.inner.create_library(name)
    }
    fn load_library(&self) -> Result<Option<Library>, StorageError> {
        self.inner.load_library()
    }
    fn save_library(&mut self, library: &Library) -> Result<(), StorageError> {
        self.saved_lock_states.push(library.is_locked());
        self.inner.save_library(library)
    }
    fn set_locked(&mut self, locked: bool) -> Result<(), StorageError> {
        self.inner.set_locked(locked)
    }
    fn load_subgraph(&self, name: &str) -> Result<Subgraph, StorageError> {
        self.inner.load_subgraph(name)
    }
    fn list_subgraphs(&self) -> Result<Vec<SubgraphSummary>, StorageError> {
        self.inner.list_subgraphs()
    }
}

fn config(quirk: bool) -> GeneratorConfig {
    GeneratorConfig {
        library_name: Some("planar2_lib".to_string()),
        zero_row_collapse: quirk,
        ..Default::default()
    }
}

fn planar2_rows() -> InMemoryRowStore {
    InMemoryRowStore::from_rows([["q1", "q2"], ["0", "0"]])
}

/// Rows of width `n`; row `k` is all zeros when `zero[k - 1]` is set.
fn rows_with_zeros(zero: &[bool]) -> InMemoryRowStore {
    let n = zero.len();
    InMemoryRowStore::from_rows(zero.iter().enumerate().map(|(i, &z)| {
        (0..n)
            .map(|j| {
                if z {
                    "0".to_string()
                } else {
                    format!("m{}*q{}", i + 1, j + 1)
                }
            })
            .collect::<Vec<_>>()
    }))
}

fn count(sg: &Subgraph, pred: impl Fn(&BlockKind) -> bool) -> usize {
    sg.find_blocks(pred).len()
}

fn concat_of(sg: &Subgraph) -> NodeId {
    sg.find_blocks(|k| matches!(k, BlockKind::Concatenate { .. }))[0]
}

fn all_outputs_consumed(sg: &Subgraph) -> bool {
    sg.node_ids().into_iter().all(|id| {
        let block = sg.block(id).unwrap();
        (0..block.output_ports()).all(|p| sg.output_is_consumed(id, p))
    })
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[test]
fn planar_two_link_with_quirk() {
    let mut store = InMemoryStore::new();
    let summary = regenerate(&mut store, &config(true), &planar2_rows()).unwrap();

    assert_eq!(summary.joints, 2);
    assert_eq!(summary.inertia.corrections.len(), 1);
    assert_eq!(summary.inertia.corrections[0].0, 2);

    let lib = store.load_library().unwrap().unwrap();
    assert!(lib.is_locked());
    assert_eq!(lib.subgraph_names(), vec!["inertia_matrix", "inverse_inertia_matrix"]);

    let m = lib.subgraph("inertia_matrix").unwrap();
    assert_eq!(count(m, |k| matches!(k, BlockKind::RowFunction { .. })), 2);
    let concat = concat_of(m);
    assert_eq!(
        m.block(concat).unwrap().kind,
        BlockKind::Concatenate {
            dimension: ConcatDimension::Rows,
            arity: 2
        }
    );

    let row1 = m.row_function(1).unwrap();
    let row2 = m.row_function(2).unwrap();
    assert_eq!(m.driver_of(concat, 0), Some((row1, 0)));
    let (fix, _) = m.driver_of(concat, 1).unwrap();
    assert_eq!(
        m.block(fix).unwrap().kind,
        BlockKind::DimensionCorrection { arity: 2 }
    );
    assert_eq!(m.driver_of(fix, 0), Some((row2, 0)));
    assert_eq!(m.driver_of(fix, 1), Some((row2, 0)));

    let output = m.find_blocks(|k| matches!(k, BlockKind::Output))[0];
    assert_eq!(m.driver_of(output, 0), Some((concat, 0)));

    let inv = lib.subgraph("inverse_inertia_matrix").unwrap();
    let instances = inv.find_blocks(|k| {
        matches!(k, BlockKind::SubgraphInstance { subgraph, .. } if subgraph == "inertia_matrix")
    });
    assert_eq!(instances.len(), 1);
    let invert = inv.find_blocks(|k| matches!(k, BlockKind::Invert))[0];
    let out = inv.find_blocks(|k| matches!(k, BlockKind::Output))[0];
    assert_eq!(inv.driver_of(invert, 0), Some((instances[0], 0)));
    assert_eq!(inv.driver_of(out, 0), Some((invert, 0)));

    lib.validate().unwrap();
}

#[test]
fn planar_two_link_without_quirk_has_no_correction() {
    let mut store = InMemoryStore::new();
    let summary = regenerate(&mut store, &config(false), &planar2_rows()).unwrap();
    assert!(summary.inertia.corrections.is_empty());

    let lib = store.load_library().unwrap().unwrap();
    let m = lib.subgraph("inertia_matrix").unwrap();
    assert_eq!(
        count(m, |k| matches!(k, BlockKind::DimensionCorrection { .. })),
        0
    );
}

#[test]
fn rows_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planar2.json");
    std::fs::write(
        &path,
        r#"{ "robot": "planar2", "joints": 2, "rows": { "1": ["q1", "q2"], "2": ["0", "0.0"] } }"#,
    )
    .unwrap();
    let rows = JsonRowStore::open(&path).unwrap();
    let cfg = GeneratorConfig {
        zero_row_collapse: true,
        ..Default::default()
    }
    .with_robot_defaults(rows.robot());

    let mut store = InMemoryStore::new();
    let summary = regenerate(&mut store, &cfg, &rows).unwrap();
    assert_eq!(summary.library, "planar2_lib");
    assert_eq!(summary.inertia.corrections.len(), 1);
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn rerun_is_structurally_identical() {
    let mut store = InMemoryStore::new();
    let first = regenerate(&mut store, &config(true), &planar2_rows()).unwrap();
    let before = fingerprint_library(&store.load_library().unwrap().unwrap()).unwrap();

    let second = regenerate(&mut store, &config(true), &planar2_rows()).unwrap();
    let after = fingerprint_library(&store.load_library().unwrap().unwrap()).unwrap();

    assert_eq!(first.inertia_fingerprint, second.inertia_fingerprint);
    assert_eq!(first.inverse_fingerprint, second.inverse_fingerprint);
    assert_eq!(before, after);
    assert_eq!(store.list_subgraphs().unwrap().len(), 2);
}

#[test]
fn rerunning_each_builder_keeps_one_subgraph_per_name() {
    let mut store = InMemoryStore::new();
    let mut session = LibrarySession::open_or_create(&mut store, "lib").unwrap();
    session.unlock();
    let rows = planar2_rows();
    let caps = Capabilities {
        zero_row_collapse: true,
    };

    let a = build_inertia_subgraph(&mut session, "M", 2, &rows, caps).unwrap();
    let b = build_inertia_subgraph(&mut session, "M", 2, &rows, caps).unwrap();
    let c = build_inverse_subgraph(&mut session, "Minv", "M").unwrap();
    let d = build_inverse_subgraph(&mut session, "Minv", "M").unwrap();

    assert_eq!(a, b);
    assert_eq!(c, d);
    assert_eq!(session.library().subgraph_names(), vec!["M", "Minv"]);
}

#[test]
fn unrelated_subgraphs_survive() {
    let mut store = InMemoryStore::new();
    let mut lib = store.create_library("planar2_lib").unwrap();
    let mut other = Subgraph::new("gravity_vector");
    other.add_block(inertia_core::Block::new(BlockKind::Input, "q"));
    lib.replace_subgraph(other);
    store.save_library(&lib).unwrap();

    regenerate(&mut store, &config(true), &planar2_rows()).unwrap();

    let lib = store.load_library().unwrap().unwrap();
    assert_eq!(
        lib.subgraph_names(),
        vec!["gravity_vector", "inertia_matrix", "inverse_inertia_matrix"]
    );
    assert_eq!(lib.subgraph("gravity_vector").unwrap().node_count(), 1);
}

// ---------------------------------------------------------------------------
// Lock discipline and checkpoints
// ---------------------------------------------------------------------------

#[test]
fn lock_transitions_across_a_run() {
    let mut store = RecordingStore::default();
    regenerate(&mut store, &config(true), &planar2_rows()).unwrap();

    // Created locked, unlocked for both subgraph checkpoints, locked at the end.
    assert_eq!(store.saved_lock_states, vec![false, false, true]);
    assert_eq!(store.inner.save_count(), 4);
    assert!(store.load_library().unwrap().unwrap().is_locked());
}

#[test]
fn reopening_skips_creation_checkpoint() {
    let mut store = InMemoryStore::new();
    regenerate(&mut store, &config(true), &planar2_rows()).unwrap();
    let after_first = store.save_count();
    regenerate(&mut store, &config(true), &planar2_rows()).unwrap();
    assert_eq!(store.save_count() - after_first, 3);
}

#[test]
fn missing_row_leaves_container_unchanged_and_locked() {
    let mut store = InMemoryStore::new();
    regenerate(&mut store, &config(true), &planar2_rows()).unwrap();
    let before = fingerprint_library(&store.load_library().unwrap().unwrap()).unwrap();

    let mut rows = InMemoryRowStore::from_rows([["a", "b", "c"], ["d", "e", "f"], ["g", "h", "i"]]);
    rows.remove(2);
    match regenerate(&mut store, &config(true), &rows) {
        Err(GenerateError::RowExpressionMissing { row }) => assert_eq!(row, 2),
        other => panic!("expected RowExpressionMissing, got {other:?}"),
    }

    let lib = store.load_library().unwrap().unwrap();
    assert!(lib.is_locked());
    assert_eq!(fingerprint_library(&lib).unwrap(), before);
}

#[test]
fn missing_last_row_is_reported_not_shrunk() {
    let mut store = InMemoryStore::new();
    regenerate(&mut store, &config(true), &planar2_rows()).unwrap();
    let before = fingerprint_library(&store.load_library().unwrap().unwrap()).unwrap();

    let mut rows =
        InMemoryRowStore::from_rows([["a", "b", "c"], ["0", "0", "0"], ["g", "h", "i"]]);
    rows.remove(3);
    match regenerate(&mut store, &config(true), &rows) {
        Err(GenerateError::RowExpressionMissing { row }) => assert_eq!(row, 3),
        other => panic!("expected RowExpressionMissing, got {other:?}"),
    }

    let lib = store.load_library().unwrap().unwrap();
    assert!(lib.is_locked());
    assert_eq!(fingerprint_library(&lib).unwrap(), before);
}

#[test]
fn json_rows_missing_last_row_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r3.json");
    std::fs::write(
        &path,
        r#"{ "robot": "r3", "joints": 3, "rows": { "1": ["a", "b", "c"], "2": ["0", "0", "0"] } }"#,
    )
    .unwrap();
    let rows = JsonRowStore::open(&path).unwrap();

    let mut store = InMemoryStore::new();
    assert!(matches!(
        regenerate(&mut store, &config(true), &rows),
        Err(GenerateError::RowExpressionMissing { row: 3 })
    ));
    assert_eq!(store.load_library().unwrap().unwrap().subgraph_count(), 0);
}

#[test]
fn empty_row_store_is_invalid_joint_count() {
    let mut store = InMemoryStore::new();
    assert!(matches!(
        regenerate(&mut store, &config(true), &InMemoryRowStore::new(0)),
        Err(GenerateError::InvalidJointCount { joints: 0 })
    ));
    assert!(store.load_library().unwrap().unwrap().is_locked());
}

#[test]
fn inverse_before_inertia_is_missing_dependency() {
    let mut store = InMemoryStore::new();
    let mut session = LibrarySession::open_or_create(&mut store, "lib").unwrap();
    session.unlock();

    match build_inverse_subgraph(&mut session, "inverse_inertia_matrix", "inertia_matrix") {
        Err(GenerateError::MissingDependency { name, .. }) => assert_eq!(name, "inertia_matrix"),
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn library_name_mismatch_fails_before_editing() {
    let mut store = InMemoryStore::new();
    store.create_library("someone_else").unwrap();
    assert!(matches!(
        regenerate(&mut store, &config(true), &planar2_rows()),
        Err(GenerateError::ContainerIo(StorageError::NameMismatch { .. }))
    ));
    assert_eq!(store.load_library().unwrap().unwrap().subgraph_count(), 0);
}

// ---------------------------------------------------------------------------
// SQLite container
// ---------------------------------------------------------------------------

#[test]
fn sqlite_container_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planar2_lib.db");

    let summary = regenerate(SqliteStore::new(&path).unwrap(), &config(true), &planar2_rows())
        .unwrap();

    let reopened = SqliteStore::new(&path).unwrap();
    let lib = reopened.load_library().unwrap().unwrap();
    assert!(lib.is_locked());
    let fingerprints = fingerprint_library(&lib).unwrap();
    assert_eq!(fingerprints[0].1.to_hex().to_string(), summary.inertia_fingerprint);
    assert_eq!(fingerprints[1].1.to_hex().to_string(), summary.inverse_fingerprint);
    lib.validate().unwrap();
}

#[test]
fn sqlite_failed_run_is_locked_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planar2_lib.db");
    let mut rows = planar2_rows();
    rows.remove(1);

    let result = regenerate(SqliteStore::new(&path).unwrap(), &config(true), &rows);
    assert!(matches!(
        result,
        Err(GenerateError::RowExpressionMissing { row: 1 })
    ));

    let lib = SqliteStore::new(&path).unwrap().load_library().unwrap().unwrap();
    assert!(lib.is_locked());
    assert_eq!(lib.subgraph_count(), 0);
}

#[test]
fn corrupt_container_is_container_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planar2_lib.db");
    std::fs::write(&path, vec![0x5Au8; 4096]).unwrap();

    let err = SqliteStore::new(&path)
        .map_err(GenerateError::from)
        .and_then(|store| regenerate(store, &config(true), &planar2_rows()))
        .unwrap_err();
    assert!(matches!(err, GenerateError::ContainerIo(_)));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn structure_holds_for_any_joint_count(
        zero in prop::collection::vec(any::<bool>(), 1..9),
        quirk in any::<bool>(),
    ) {
        let n = zero.len();
        let rows = rows_with_zeros(&zero);
        let mut store = InMemoryStore::new();
        let mut session = LibrarySession::open_or_create(&mut store, "lib").unwrap();
        session.unlock();
        let caps = Capabilities { zero_row_collapse: quirk };

        build_inertia_subgraph(&mut session, "M", n, &rows, caps).unwrap();
        let m = session.library().subgraph("M").unwrap();

        prop_assert_eq!(count(m, |k| matches!(k, BlockKind::Input)), 1);
        prop_assert_eq!(count(m, |k| matches!(k, BlockKind::Output)), 1);
        prop_assert_eq!(count(m, |k| matches!(k, BlockKind::Concatenate { .. })), 1);
        prop_assert_eq!(count(m, |k| matches!(k, BlockKind::RowFunction { .. })), n);

        let concat = concat_of(m);
        prop_assert_eq!(
            &m.block(concat).unwrap().kind,
            &BlockKind::Concatenate { dimension: ConcatDimension::Rows, arity: n as u16 }
        );

        let mut corrections = 0;
        for k in 1..=n {
            let row_fn = m.row_function(k).unwrap();
            let (driver, _) = m.driver_of(concat, (k - 1) as u16).unwrap();
            if quirk && zero[k - 1] {
                corrections += 1;
                prop_assert_eq!(
                    &m.block(driver).unwrap().kind,
                    &BlockKind::DimensionCorrection { arity: n as u16 }
                );
                for port in 0..n as u16 {
                    prop_assert_eq!(m.driver_of(driver, port), Some((row_fn, 0)));
                }
            } else {
                prop_assert_eq!(driver, row_fn);
            }
        }
        prop_assert_eq!(
            count(m, |k| matches!(k, BlockKind::DimensionCorrection { .. })),
            corrections
        );
        prop_assert!(all_outputs_consumed(m));
        prop_assert!(m.validate().is_ok());
    }

    #[test]
    fn rebuild_fingerprint_is_stable(
        zero in prop::collection::vec(any::<bool>(), 1..6),
        quirk in any::<bool>(),
    ) {
        let rows = rows_with_zeros(&zero);
        let cfg = GeneratorConfig {
            library_name: Some("lib".to_string()),
            zero_row_collapse: quirk,
            ..Default::default()
        };
        let mut store = InMemoryStore::new();
        let first = regenerate(&mut store, &cfg, &rows).unwrap();
        let second = regenerate(&mut store, &cfg, &rows).unwrap();
        prop_assert_eq!(first.inertia_fingerprint, second.inertia_fingerprint);
        prop_assert_eq!(first.inverse_fingerprint, second.inverse_fingerprint);
        prop_assert_eq!(store.list_subgraphs().unwrap().len(), 2);
    }
}
