//! FILENAME: engine/src/error.rs
//! PURPOSE: The three exception kinds `Sheet` can raise out of an edit call.
//! CONTEXT: A fourth error kind, `FormulaError`, is data rather than an
//! exception — it lives in a formula cell's cache and is returned from
//! `get_value`, never propagated as a `Result::Err` here.

use std::fmt;

/// Fatal-to-the-call, never-fatal-to-the-sheet errors from the edit protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    /// A position failed `Position::is_valid()`.
    InvalidPosition,
    /// `set_cell` received formula text that failed to parse.
    FormulaException(String),
    /// `set_cell` would close a cycle in the dependency graph.
    CircularDependency,
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::InvalidPosition => write!(f, "invalid position"),
            SheetError::FormulaException(msg) => write!(f, "formula error: {msg}"),
            SheetError::CircularDependency => write!(f, "circular dependency"),
        }
    }
}

impl std::error::Error for SheetError {}
