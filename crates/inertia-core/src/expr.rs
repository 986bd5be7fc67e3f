//! Precomputed symbolic rows of the inertia matrix.
//!
//! A [`RowExpression`] is produced by an external derivation step and only
//! read here. Each entry is the symbolic text of one matrix element as a
//! function of the generalized coordinates.

use serde::{Deserialize, Serialize};

/// One row of the joint-space inertia matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowExpression {
    /// 1-based row index.
    pub row: usize,
    /// Name of the generated row function.
    pub function: String,
    /// Symbolic entries, left to right.
    pub entries: Vec<String>,
}

impl RowExpression {
    /// Creates a row with the default function name `inertia_row_<row>`.
    pub fn new(row: usize, entries: Vec<String>) -> Self {
        RowExpression {
            row,
            function: format!("inertia_row_{}", row),
            entries,
        }
    }

    /// Number of entries in the row.
    pub fn width(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if this row is exactly the all-zero row of `width`
    /// entries.
    ///
    /// Exact equality only: every entry must be a numeric literal equal to
    /// zero. Symbolic expressions that merely simplify to zero, or numbers
    /// close to zero, do not count.
    pub fn is_zero_row(&self, width: usize) -> bool {
        self.entries.len() == width && self.entries.iter().all(|e| is_literal_zero(e))
    }
}

/// Returns `true` if `entry` is a numeric literal whose digits are all zero
/// (`0`, `0.0`, `-0`, `0e0`, ...).
///
/// Decided on the text rather than a parsed float, so a literal such as
/// `1e-400` that underflows to `0.0` is still non-zero.
pub fn is_literal_zero(entry: &str) -> bool {
    let text = entry.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mantissa = match unsigned.find(['e', 'E']) {
        Some(pos) => {
            let exponent = &unsigned[pos + 1..];
            let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if exponent.is_empty() || !exponent.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            &unsigned[..pos]
        }
        None => unsigned,
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    whole.bytes().chain(fraction.bytes()).all(|b| b == b'0')
}
