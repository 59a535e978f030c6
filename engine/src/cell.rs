//! FILENAME: engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single spreadsheet cell.
//! CONTEXT: A cell is exactly one of Empty, Text, or Formula. Formula cells
//! own a parsed AST from the `parser` crate plus a memoized result; the
//! cache lives behind a `RefCell` so `get_value` can populate it from a
//! shared reference (see `Sheet`'s single-threaded mutation discipline).

use parser::{FormulaError, Formula, Position};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::error::SheetError;

/// The calculated result of reading a cell: exactly what a host asked for,
/// never an intermediate evaluation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

/// The atomic unit of the spreadsheet: exactly one of these three shapes.
#[derive(Debug, Clone)]
pub enum Cell {
    Empty,
    Text {
        /// Raw text as entered, including a leading `'` if present.
        text: String,
        /// `text` with a leading `'` stripped; equal to `text` otherwise.
        display: String,
    },
    Formula {
        formula: Formula,
        /// Absent until the first `get_value` call; dropped by `clear_cache`.
        cache: RefCell<Option<Result<f64, FormulaError>>>,
    },
}

impl Cell {
    /// Installs new content, replacing whatever this cell held before.
    ///
    /// `verify` is called with the proposed formula's reference list only
    /// when `text` parses as a formula; it runs after parsing but before
    /// this cell is mutated, so a `verify` failure (or a parse failure)
    /// leaves `self` untouched.
    pub fn set(
        &mut self,
        text: &str,
        verify: impl FnOnce(&[Position]) -> Result<(), SheetError>,
    ) -> Result<(), SheetError> {
        let classified = Self::classify(text, verify)?;
        *self = classified;
        Ok(())
    }

    /// Parse classification, in the exact order the cell content model requires:
    /// empty text, then a literal `'` escape, then the bare `"="` literal,
    /// then a real formula, then plain text. Rule 3 (bare `=`) must precede
    /// rule 4 (formula) or a lone `=` would fail to parse as a formula.
    fn classify(
        text: &str,
        verify: impl FnOnce(&[Position]) -> Result<(), SheetError>,
    ) -> Result<Cell, SheetError> {
        if text.is_empty() {
            return Ok(Cell::Empty);
        }

        if let Some(rest) = text.strip_prefix('\'') {
            return Ok(Cell::Text {
                text: text.to_string(),
                display: rest.to_string(),
            });
        }

        if text == "=" {
            return Ok(Cell::Text {
                text: text.to_string(),
                display: text.to_string(),
            });
        }

        if let Some(expression) = text.strip_prefix('=') {
            let formula = parser::parse_formula(expression)
                .map_err(|e| SheetError::FormulaException(e.to_string()))?;
            verify(formula.get_referenced_cells())?;
            return Ok(Cell::Formula {
                formula,
                cache: RefCell::new(None),
            });
        }

        Ok(Cell::Text {
            text: text.to_string(),
            display: text.to_string(),
        })
    }

    /// Resets this cell to `Empty`.
    pub fn clear(&mut self) {
        *self = Cell::Empty;
    }

    /// Returns this cell's value, evaluating and memoizing on first read
    /// for formula cells. `sheet` is the enclosing sheet, passed explicitly
    /// rather than held as a back-pointer so evaluation can borrow it
    /// read-only without creating a self-referential structure.
    pub fn get_value(&self, sheet: &crate::sheet::Sheet) -> CellValue {
        match self {
            Cell::Empty => CellValue::Text(String::new()),
            Cell::Text { display, .. } => CellValue::Text(display.clone()),
            Cell::Formula { formula, cache } => {
                if let Some(cached) = *cache.borrow() {
                    return match cached {
                        Ok(n) => CellValue::Number(n),
                        Err(e) => CellValue::Error(e),
                    };
                }
                let result = formula.evaluate(sheet);
                *cache.borrow_mut() = Some(result);
                match result {
                    Ok(n) => CellValue::Number(n),
                    Err(e) => CellValue::Error(e),
                }
            }
        }
    }

    /// The exact text a user would see in an editor for this cell.
    pub fn get_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text { text, .. } => text.clone(),
            Cell::Formula { formula, .. } => format!("={}", formula.get_expression()),
        }
    }

    /// The cells this cell's formula reads; empty for non-formula cells.
    pub fn get_referenced_cells(&self) -> &[Position] {
        match self {
            Cell::Formula { formula, .. } => formula.get_referenced_cells(),
            _ => &[],
        }
    }

    /// Drops a populated formula cache, returning whether it was present.
    /// A `false` return lets `Sheet`'s invalidation walk stop early: a
    /// cell with no cache cannot have contributed a cached value downstream.
    pub fn clear_cache(&self) -> bool {
        match self {
            Cell::Formula { cache, .. } => {
                let mut cache = cache.borrow_mut();
                if cache.is_some() {
                    *cache = None;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// True iff this is a formula cell currently holding a memoized result.
    pub fn has_value(&self) -> bool {
        match self {
            Cell::Formula { cache, .. } => cache.borrow().is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Sheet;

    fn ok_verify(_refs: &[Position]) -> Result<(), SheetError> {
        Ok(())
    }

    #[test]
    fn test_classify_empty() {
        let mut cell = Cell::Empty;
        cell.set("", ok_verify).unwrap();
        assert_eq!(cell.get_text(), "");
        assert!(matches!(cell, Cell::Empty));
    }

    #[test]
    fn test_classify_quoted_text_strips_leading_quote_in_display_only() {
        let mut cell = Cell::Empty;
        cell.set("'=5", ok_verify).unwrap();
        assert_eq!(cell.get_text(), "'=5");
        let sheet = Sheet::new();
        assert_eq!(cell.get_value(&sheet), CellValue::Text("=5".to_string()));
    }

    #[test]
    fn test_classify_bare_equals_is_literal_text() {
        let mut cell = Cell::Empty;
        cell.set("=", ok_verify).unwrap();
        assert_eq!(cell.get_text(), "=");
        let sheet = Sheet::new();
        assert_eq!(cell.get_value(&sheet), CellValue::Text("=".to_string()));
    }

    #[test]
    fn test_classify_formula() {
        let mut cell = Cell::Empty;
        cell.set("=1+2", ok_verify).unwrap();
        assert!(matches!(cell, Cell::Formula { .. }));
        assert_eq!(cell.get_text(), "=1+2");
    }

    #[test]
    fn test_classify_plain_text() {
        let mut cell = Cell::Empty;
        cell.set("hello", ok_verify).unwrap();
        assert_eq!(cell.get_text(), "hello");
    }

    #[test]
    fn test_classify_malformed_formula_leaves_cell_unchanged() {
        let mut cell = Cell::Empty;
        cell.set("hello", ok_verify).unwrap();
        let err = cell.set("=1+", ok_verify).unwrap_err();
        assert!(matches!(err, SheetError::FormulaException(_)));
        assert_eq!(cell.get_text(), "hello");
    }

    #[test]
    fn test_verify_rejection_leaves_cell_unchanged() {
        let mut cell = Cell::Empty;
        cell.set("hello", ok_verify).unwrap();
        let err = cell
            .set("=A1", |_refs| Err(SheetError::CircularDependency))
            .unwrap_err();
        assert!(matches!(err, SheetError::CircularDependency));
        assert_eq!(cell.get_text(), "hello");
    }

    #[test]
    fn test_clear_cache_lifecycle() {
        let mut cell = Cell::Empty;
        cell.set("=1+1", ok_verify).unwrap();
        assert!(!cell.has_value());
        assert!(!cell.clear_cache());

        let sheet = Sheet::new();
        let _ = cell.get_value(&sheet);
        assert!(cell.has_value());
        assert!(cell.clear_cache());
        assert!(!cell.has_value());
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let mut cell = Cell::Empty;
        cell.set("hello", ok_verify).unwrap();
        cell.clear();
        assert!(matches!(cell, Cell::Empty));
    }

    #[test]
    fn test_cell_value_serde_round_trip() {
        let values = [
            CellValue::Text("hi".to_string()),
            CellValue::Number(3.5),
            CellValue::Error(FormulaError::Div0),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: CellValue = serde_json::from_str(&json).unwrap();
            assert_eq!(value, back);
        }
    }
}
