//! Inertia block-library generator CLI.
//!
//! Provides the `inertia` binary:
//!
//! - `generate` rebuilds the inertia-matrix and inverse-inertia-matrix
//!   subgraphs of a robot's block library from a row expression file.
//! - `inspect` prints the subgraphs stored in a library, or one subgraph.
//! - `validate` checks every stored subgraph and every subgraph reference.
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use inertia_gen::{
    regenerate, ConfigError, GenerateError, GeneratorConfig, JsonRowStore, RowStoreError,
};
use inertia_storage::{LibraryStore, SqliteStore, StorageError};

/// Exit code for a successful command.
const EXIT_OK: i32 = 0;
/// Exit code for a generation or validation failure.
const EXIT_GENERATION: i32 = 1;
/// Exit code when a precondition (row expression, dependency) is missing.
const EXIT_PRECONDITION: i32 = 2;
/// Exit code for I/O failures on the library, row file, or config file.
const EXIT_IO: i32 = 3;

/// Generates inertia-matrix block libraries.
#[derive(Parser)]
#[command(name = "inertia", about = "Inertia-matrix block library generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Rebuild the inertia and inverse-inertia subgraphs.
    Generate {
        /// Row expression file (JSON).
        #[arg(short, long)]
        rows: PathBuf,

        /// Library database file (default: <library_name>.db).
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Library name (default: <robot>_lib).
        #[arg(short, long)]
        name: Option<String>,

        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Widen all-zero rows that the code generator collapses to scalars.
        #[arg(long)]
        zero_row_quirk: bool,
    },

    /// List the subgraphs of a library, or dump one subgraph.
    Inspect {
        /// Library database file.
        #[arg(short, long)]
        library: PathBuf,

        /// Subgraph to dump.
        #[arg(short, long)]
        subgraph: Option<String>,
    },

    /// Check that every subgraph in a library is well-formed.
    Validate {
        /// Library database file.
        #[arg(short, long)]
        library: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Generate {
            rows,
            library,
            name,
            config,
            zero_row_quirk,
        } => run_generate(&rows, library, name, config.as_deref(), zero_row_quirk),
        Commands::Inspect { library, subgraph } => run_inspect(&library, subgraph.as_deref()),
        Commands::Validate { library } => run_validate(&library),
    };
    process::exit(exit_code);
}

/// Execute the generate subcommand.
fn run_generate(
    rows_path: &Path,
    library: Option<PathBuf>,
    name: Option<String>,
    config_path: Option<&Path>,
    zero_row_quirk: bool,
) -> i32 {
    let rows = match JsonRowStore::open(rows_path) {
        Ok(rows) => rows,
        Err(e) => return report(&GenerateError::from(e)),
    };

    let config = match resolve_config(config_path, library, name, zero_row_quirk, rows.robot()) {
        Ok(config) => config,
        Err(e) => return report(&GenerateError::from(e)),
    };
    let library_path = match config.library_path() {
        Ok(path) => path.to_path_buf(),
        Err(e) => return report(&GenerateError::from(e)),
    };

    let store = match SqliteStore::new(&library_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(
                library = %library_path.display(),
                error = %e,
                "failed to open library"
            );
            return EXIT_IO;
        }
    };

    tracing::info!(
        rows = %rows_path.display(),
        robot = rows.robot(),
        library = %library_path.display(),
        "generating"
    );
    match regenerate(store, &config, &rows) {
        Ok(summary) => print_json(&summary),
        Err(e) => report(&e),
    }
}

/// Layers defaults, the config file, the environment, and CLI flags.
fn resolve_config(
    config_path: Option<&Path>,
    library: Option<PathBuf>,
    name: Option<String>,
    zero_row_quirk: bool,
    robot: &str,
) -> Result<GeneratorConfig, ConfigError> {
    let mut config = match config_path {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    config.apply_env()?;
    if library.is_some() {
        config.library_path = library;
    }
    if name.is_some() {
        config.library_name = name;
    }
    if zero_row_quirk {
        config.zero_row_collapse = true;
    }
    Ok(config.with_robot_defaults(robot))
}

/// Execute the inspect subcommand.
fn run_inspect(library_path: &Path, subgraph: Option<&str>) -> i32 {
    let store = match open_existing(library_path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    match subgraph {
        None => match store.list_subgraphs() {
            Ok(summaries) => print_json(&summaries),
            Err(e) => report(&GenerateError::from(e)),
        },
        Some(name) => match store.load_subgraph(name) {
            Ok(sg) => print_json(&sg),
            Err(StorageError::SubgraphNotFound(name)) => {
                tracing::error!(subgraph = %name, "no such subgraph");
                EXIT_PRECONDITION
            }
            Err(e) => report(&GenerateError::from(e)),
        },
    }
}

/// Execute the validate subcommand.
fn run_validate(library_path: &Path) -> i32 {
    let store = match open_existing(library_path) {
        Ok(store) => store,
        Err(code) => return code,
    };
    let library = match store.load_library() {
        Ok(Some(library)) => library,
        Ok(None) => {
            tracing::error!(library = %library_path.display(), "file holds no library");
            return EXIT_PRECONDITION;
        }
        Err(e) => return report(&GenerateError::from(e)),
    };

    match library.validate() {
        Ok(()) => {
            println!(
                "{}: {} subgraph(s) valid",
                library.name(),
                library.subgraph_count()
            );
            EXIT_OK
        }
        Err(e) => {
            tracing::error!(library = library.name(), error = %e, "validation failed");
            EXIT_GENERATION
        }
    }
}

/// Opens a library file that must already exist.
fn open_existing(path: &Path) -> Result<SqliteStore, i32> {
    if !path.exists() {
        tracing::error!(library = %path.display(), "library does not exist");
        return Err(EXIT_IO);
    }
    SqliteStore::new(path).map_err(|e| {
        tracing::error!(library = %path.display(), error = %e, "failed to open library");
        EXIT_IO
    })
}

/// Logs `err` and returns its exit code.
fn report(err: &GenerateError) -> i32 {
    let code = exit_code(err);
    tracing::error!(exit_code = code, "{}", err);
    code
}

/// Maps a pipeline error to the process exit code.
fn exit_code(err: &GenerateError) -> i32 {
    match err {
        GenerateError::ContainerIo(_) => EXIT_IO,
        GenerateError::RowStore(RowStoreError::Read { .. }) => EXIT_IO,
        GenerateError::Config(ConfigError::ReadError { .. }) => EXIT_IO,
        GenerateError::RowExpressionMissing { .. } | GenerateError::MissingDependency { .. } => {
            EXIT_PRECONDITION
        }
        _ => EXIT_GENERATION,
    }
}

/// Prints a value as pretty JSON to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            EXIT_OK
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize result");
            EXIT_GENERATION
        }
    }
}
