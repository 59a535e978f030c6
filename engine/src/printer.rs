//! FILENAME: engine/src/printer.rs
//! PURPOSE: Tab/newline formatted dumps of a sheet's values and texts.
//! CONTEXT: A thin utility over `Sheet`'s read API — it owns no state of
//! its own and never sees a cell variant directly, only what `get_value`/
//! `get_text` choose to return.

use std::fmt::Write;

use parser::Position;

use crate::cell::CellValue;
use crate::sheet::Sheet;

/// Writes `sheet`'s values: one row per stored row, `width` tab-separated
/// columns, a trailing newline per row. Missing cells render empty.
pub fn print_values(sheet: &Sheet, out: &mut impl Write) -> std::fmt::Result {
    let (rows, cols) = sheet.get_printable_size();
    for row in 0..rows {
        for col in 0..cols {
            if col != 0 {
                write!(out, "\t")?;
            }
            let pos = Position::new(row as u32, col as u32);
            if let Ok(Some(cell)) = sheet.get_cell(pos) {
                match cell.get_value(sheet) {
                    CellValue::Text(s) => write!(out, "{s}")?,
                    CellValue::Number(n) => write!(out, "{n}")?,
                    CellValue::Error(e) => write!(out, "{e}")?,
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes `sheet`'s editor-visible texts in the same tab/newline layout.
pub fn print_texts(sheet: &Sheet, out: &mut impl Write) -> std::fmt::Result {
    let (rows, cols) = sheet.get_printable_size();
    for row in 0..rows {
        for col in 0..cols {
            if col != 0 {
                write!(out, "\t")?;
            }
            let pos = Position::new(row as u32, col as u32);
            if let Ok(Some(cell)) = sheet.get_cell(pos) {
                write!(out, "{}", cell.get_text())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
