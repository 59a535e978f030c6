//! FILENAME: parser/src/error.rs
//! PURPOSE: The tagged error category an evaluated formula can produce.
//! CONTEXT: Used both as an evaluation outcome (stored in a formula cell's
//! cache) and as a signal threaded out of the AST executor on failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single tagged error category. Equality and hashing are by category alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaError {
    /// A reference to a cell or range that cannot be resolved.
    Ref,
    /// An operand could not be coerced to the type an operator/function needs.
    Value,
    /// Division by zero.
    Div0,
}

impl FormulaError {
    /// Short category string: `REF` | `VALUE` | `ARITHM`.
    ///
    /// `Div0` renders as `ARITHM` rather than `DIV0` — the original engine
    /// this was distilled from used a single arithmetic-error spelling for
    /// its ostream operator (`#ARITHM!`) and its `to_string()` (`ARITHM`);
    /// we keep that spelling rather than inventing a new one.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaError::Ref => "REF",
            FormulaError::Value => "VALUE",
            FormulaError::Div0 => "ARITHM",
        }
    }
}

/// We render every error the same way wherever it surfaces (printed grids,
/// `Display`, `as_str()`) rather than keeping the original C++'s two
/// inconsistent renderings (a category-blind `#ARITHM!` from its ostream
/// operator vs. a category-aware `to_string()`). See DESIGN.md.
impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for FormulaError {}
