//! The full regeneration run.

use inertia_storage::{fingerprint_subgraph, LibraryStore};
use serde::Serialize;

use crate::builder::{build_inertia_subgraph, InertiaSummary};
use crate::capabilities::Capabilities;
use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::inverse::{build_inverse_subgraph, InverseSummary};
use crate::rows::RowExpressionStore;
use crate::session::LibrarySession;

/// Result of a successful [`regenerate`].
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub library: String,
    pub location: String,
    pub joints: usize,
    pub inertia: InertiaSummary,
    pub inverse: InverseSummary,
    /// blake3 structural fingerprints, hex encoded.
    pub inertia_fingerprint: String,
    pub inverse_fingerprint: String,
}

/// Opens (or creates) the library in `store`, rebuilds the inertia and
/// inverse subgraphs from `rows`, and leaves the library locked and saved.
///
/// The joint count is the one `rows` declares. On failure the library is re-locked
/// on disk and holds whatever the last completed checkpoint wrote.
pub fn regenerate<S: LibraryStore>(
    store: S,
    config: &GeneratorConfig,
    rows: &dyn RowExpressionStore,
) -> Result<RunSummary, GenerateError> {
    config.validate()?;
    let library_name = config.library_name()?;
    let capabilities = Capabilities::from_config(config);
    tracing::info!(
        library = library_name,
        zero_row_collapse = capabilities.zero_row_collapse,
        "starting regeneration"
    );

    let mut session = LibrarySession::open_or_create(store, library_name)?;
    session.unlock();

    match run_builders(&mut session, config, rows, capabilities) {
        Ok(summary) => {
            session.finalize()?;
            tracing::info!(
                library = library_name,
                inertia = %summary.inertia_fingerprint,
                inverse = %summary.inverse_fingerprint,
                "regeneration complete"
            );
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(library = library_name, error = %err, "regeneration failed");
            if let Err(abort_err) = session.abort() {
                tracing::error!(error = %abort_err, "failed to re-lock library");
            }
            Err(err)
        }
    }
}

fn run_builders<S: LibraryStore>(
    session: &mut LibrarySession<S>,
    config: &GeneratorConfig,
    rows: &dyn RowExpressionStore,
    capabilities: Capabilities,
) -> Result<RunSummary, GenerateError> {
    let joints = rows.joint_count();
    let inertia = build_inertia_subgraph(
        session,
        &config.inertia_subgraph,
        joints,
        rows,
        capabilities,
    )?;
    let inverse =
        build_inverse_subgraph(session, &config.inverse_subgraph, &config.inertia_subgraph)?;

    let library = session.library();
    let fingerprint = |name: &str| -> Result<String, GenerateError> {
        let subgraph = library
            .subgraph(name)
            .ok_or_else(|| GenerateError::MissingDependency {
                name: name.to_string(),
                reason: "vanished after build".to_string(),
            })?;
        Ok(fingerprint_subgraph(subgraph)?.to_hex().to_string())
    };

    Ok(RunSummary {
        library: library.name().to_string(),
        location: session.store().location(),
        joints,
        inertia_fingerprint: fingerprint(&inertia.subgraph)?,
        inverse_fingerprint: fingerprint(&inverse.subgraph)?,
        inertia,
        inverse,
    })
}
