//! Generator configuration.
//!
//! Resolution order, later wins:
//!
//! 1. Built-in defaults ([`GeneratorConfig::default`])
//! 2. A TOML file ([`GeneratorConfig::load`])
//! 3. Environment variables ([`GeneratorConfig::apply_env`]):
//!    `INERTIA_LIBRARY_PATH`, `INERTIA_ZERO_ROW_QUIRK`
//! 4. Command-line flags, applied by the caller by assigning fields
//!
//! ```toml
//! library_name = "planar2_lib"
//! library_path = "build/planar2_lib.db"
//! inertia_subgraph = "inertia_matrix"
//! inverse_subgraph = "inverse_inertia_matrix"
//! zero_row_collapse = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_LIBRARY_PATH: &str = "INERTIA_LIBRARY_PATH";
pub const ENV_ZERO_ROW_QUIRK: &str = "INERTIA_ZERO_ROW_QUIRK";

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Library name. Defaults to `<robot>_lib` once the robot is known.
    pub library_name: Option<String>,
    /// Library database file. Defaults to `<library_name>.db`.
    pub library_path: Option<PathBuf>,
    pub inertia_subgraph: String,
    pub inverse_subgraph: String,
    /// Compensate for row functions that collapse an all-zero row to a
    /// scalar.
    pub zero_row_collapse: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            library_name: None,
            library_path: None,
            inertia_subgraph: "inertia_matrix".to_string(),
            inverse_subgraph: "inverse_inertia_matrix".to_string(),
            zero_row_collapse: false,
        }
    }
}

impl GeneratorConfig {
    /// Reads a TOML file over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps an environment variable
    /// name to its value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = lookup(ENV_LIBRARY_PATH).filter(|p| !p.is_empty()) {
            self.library_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(ENV_ZERO_ROW_QUIRK) {
            self.zero_row_collapse = parse_flag(ENV_ZERO_ROW_QUIRK, &value)?;
        }
        Ok(())
    }

    /// Fills the library name and path from the robot name where unset.
    pub fn with_robot_defaults(mut self, robot: &str) -> Self {
        if self.library_name.is_none() {
            self.library_name = Some(format!("{robot}_lib"));
        }
        if self.library_path.is_none() {
            if let Some(name) = &self.library_name {
                self.library_path = Some(PathBuf::from(format!("{name}.db")));
            }
        }
        self
    }

    /// The library name, which must be set by now.
    pub fn library_name(&self) -> Result<&str, ConfigError> {
        self.library_name
            .as_deref()
            .ok_or_else(|| ConfigError::Missing {
                key: "library_name".to_string(),
            })
    }

    /// The library path, which must be set by now.
    pub fn library_path(&self) -> Result<&Path, ConfigError> {
        self.library_path
            .as_deref()
            .ok_or_else(|| ConfigError::Missing {
                key: "library_path".to_string(),
            })
    }

    /// Checks that both subgraph names are usable and distinct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.library_name {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: "library_name is empty".to_string(),
                });
            }
        }
        for (key, value) in [
            ("inertia_subgraph", &self.inertia_subgraph),
            ("inverse_subgraph", &self.inverse_subgraph),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: format!("{key} is empty"),
                });
            }
        }
        if self.inertia_subgraph == self.inverse_subgraph {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "inertia_subgraph and inverse_subgraph are both '{}'",
                    self.inertia_subgraph
                ),
            });
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
