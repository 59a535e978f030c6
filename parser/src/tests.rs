//! FILENAME: parser/src/tests.rs
//! PURPOSE: End-to-end tests exercising the full lexer -> parser -> formula
//! pipeline. Per-module unit tests (lexer, ast, parser, formula) live
//! alongside their own source; this file is for behavior that only shows
//! up once the pieces are wired together.

use crate::formula::{parse_formula, SheetValue, SheetView};
use crate::position::Position;
use std::cell::RefCell;
use std::collections::HashMap;

struct FakeSheet {
    cells: RefCell<HashMap<Position, SheetValue>>,
}

impl FakeSheet {
    fn new() -> Self {
        FakeSheet {
            cells: RefCell::new(HashMap::new()),
        }
    }

    fn set(&self, a1: &str, value: SheetValue) {
        let pos = parse_a1(a1);
        self.cells.borrow_mut().insert(pos, value);
    }
}

fn parse_a1(a1: &str) -> Position {
    let col_len = a1.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let (col, row) = a1.split_at(col_len);
    Position::from_a1(col, row.parse().unwrap())
}

impl SheetView for FakeSheet {
    fn get_cell_value(&self, pos: Position) -> SheetValue {
        self.cells
            .borrow()
            .get(&pos)
            .cloned()
            .unwrap_or(SheetValue::Empty)
    }
}

#[test]
fn test_budget_sheet_end_to_end() {
    let sheet = FakeSheet::new();
    sheet.set("A1", SheetValue::Number(100.0));
    sheet.set("A2", SheetValue::Number(250.0));
    sheet.set("A3", SheetValue::Number(75.0));

    let total = parse_formula("=SUM(A1:A3)").unwrap();
    assert_eq!(total.evaluate(&sheet), Ok(425.0));

    let average = parse_formula("=AVERAGE(A1:A3)").unwrap();
    assert_eq!(average.evaluate(&sheet), Ok(425.0 / 3.0));

    let over_budget = parse_formula("=IF(SUM(A1:A3)>400,1,0)").unwrap();
    assert_eq!(over_budget.evaluate(&sheet), Ok(1.0));
}

#[test]
fn test_nested_function_calls() {
    let sheet = FakeSheet::new();
    sheet.set("A1", SheetValue::Number(-9.0));

    let formula = parse_formula("=SQRT(ABS(A1))").unwrap();
    assert_eq!(formula.evaluate(&sheet), Ok(3.0));
}

#[test]
fn test_case_insensitive_function_names_and_cell_refs() {
    let sheet = FakeSheet::new();
    sheet.set("A1", SheetValue::Number(4.0));

    let formula = parse_formula("=sum(a1,a1)").unwrap();
    assert_eq!(formula.evaluate(&sheet), Ok(8.0));
}

#[test]
fn test_chained_comparisons_yield_numeric_booleans() {
    let sheet = FakeSheet::new();
    let formula = parse_formula("=(1<2)+(3>4)").unwrap();
    assert_eq!(formula.evaluate(&sheet), Ok(1.0));
}

#[test]
fn test_parse_error_on_malformed_formula() {
    assert!(parse_formula("=SUM(A1,").is_err());
    assert!(parse_formula("=1+").is_err());
}

#[test]
fn test_cell_ref_past_addressable_grid_is_ref_error() {
    use crate::error::FormulaError;
    let sheet = FakeSheet::new();
    // "ZZZZ1" parses fine syntactically but names a column far past MAX_COLS.
    let formula = parse_formula("=ZZZZ1+1").unwrap();
    assert_eq!(formula.evaluate(&sheet), Err(FormulaError::Ref));
}
