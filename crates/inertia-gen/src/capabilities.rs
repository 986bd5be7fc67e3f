//! Environment quirks the builder compensates for.

use crate::config::GeneratorConfig;

/// Capability flags resolved once at the start of a run and passed by value
/// into the builders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The downstream code generator collapses an all-zero row function
    /// output to a scalar. When set, zero rows are widened again by a
    /// dimension-correction block.
    pub zero_row_collapse: bool,
}

impl Capabilities {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Capabilities {
            zero_row_collapse: config.zero_row_collapse,
        }
    }
}
