//! FILENAME: engine/src/sheet.rs
//! PURPOSE: Sparse 2D cell storage, the forward/reverse dependency graph,
//! and the transactional edit protocol (`set_cell` / `clear_cell`).
//! CONTEXT: This is the heart of the engine. Every mutation enters through
//! `set_cell`, which rewrites back-reference edges and invalidates caches
//! along them; `Sheet` is the only thing that ever holds a `&mut Cell`.

use std::collections::{HashSet, VecDeque};

use parser::{Position, SheetValue, SheetView};

use crate::cell::{Cell, CellValue};
use crate::error::SheetError;

/// One coordinate of the sparse grid. A slot with `cell = None` has never
/// been materialized. `back_refs` holds the formula cells that reference
/// this slot; by the DAG invariant it is only ever non-empty while `cell`
/// is `Some` (a referenced cell is always auto-materialized as `Empty`).
#[derive(Debug, Default, Clone)]
struct CellSlot {
    cell: Option<Cell>,
    back_refs: Option<HashSet<Position>>,
}

/// A 2D sparse grid of cells plus their dependency graph.
///
/// `values` is row-major; `width` and `max_width_rows` track the tight
/// printable bounding box (see `get_printable_size`) incrementally, so
/// `Sheet` never needs a full rescan except on the rare "last row of the
/// widest width just got narrower" edge of `clear_cell`.
#[derive(Debug, Default)]
pub struct Sheet {
    values: Vec<Vec<CellSlot>>,
    width: usize,
    max_width_rows: usize,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet {
            values: Vec::new(),
            width: 0,
            max_width_rows: 0,
        }
    }

    /// Borrowed view of the cell at `pos`, or `None` if the slot is empty
    /// or falls outside the materialized storage.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self.cell_at(pos))
    }

    /// `(row_count, width)` of the tight bounding box around materialized cells.
    pub fn get_printable_size(&self) -> (usize, usize) {
        (self.values.len(), self.width)
    }

    /// Installs `text` as the content of `pos`. See the module docs: this
    /// is transactional — any failure (bad position, parse error, or a
    /// cycle) leaves the sheet exactly as it was before the call.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }

        self.grow_to(pos);
        self.materialize(pos);

        let old_refs: Vec<Position> = self.cell_at(pos).unwrap().get_referenced_cells().to_vec();

        // Computed with an immutable borrow before we take a mutable one on
        // the target slot below, so `verify` can be a plain owned closure
        // rather than one that needs to re-borrow `self`.
        let forbidden = self.forbidden_set(pos);

        {
            let slot = &mut self.values[pos.row as usize][pos.col as usize];
            let cell = slot.cell.as_mut().expect("materialized above");
            cell.set(text, |refs: &[Position]| {
                if refs.iter().any(|r| forbidden.contains(r)) {
                    Err(SheetError::CircularDependency)
                } else {
                    Ok(())
                }
            })?;
        }

        let new_refs: Vec<Position> = self.cell_at(pos).unwrap().get_referenced_cells().to_vec();

        for q in &old_refs {
            self.remove_back_ref(*q, pos);
        }

        for q in &new_refs {
            if !q.is_valid() {
                continue;
            }
            if self.cell_at(*q).is_none() {
                self.set_cell(*q, "")?;
            }
            self.add_back_ref(*q, pos);
        }

        self.invalidate_caches(pos);

        Ok(())
    }

    /// Resets `pos` to `Empty`. A cell still depended on by another formula
    /// stays materialized (as `Empty`) rather than being dropped.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }

        let row_idx = pos.row as usize;
        let col_idx = pos.col as usize;
        if row_idx >= self.values.len() || col_idx >= self.values[row_idx].len() {
            return Ok(());
        }

        let has_back_refs = self.values[row_idx][col_idx]
            .back_refs
            .as_ref()
            .is_some_and(|s| !s.is_empty());

        if has_back_refs {
            if let Some(cell) = self.values[row_idx][col_idx].cell.as_mut() {
                cell.clear();
            }
            return Ok(());
        }

        let row_len_before = self.values[row_idx].len();
        self.values[row_idx][col_idx].cell = None;
        self.shrink_row(row_idx);

        if row_len_before == self.width {
            self.max_width_rows -= 1;
            if self.max_width_rows == 0 {
                self.rescan_bounding_box();
            }
        }

        Ok(())
    }

    /// Dumps every cell's value, tab-separated and newline-terminated per row.
    pub fn print_values(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        crate::printer::print_values(self, out)
    }

    /// Dumps every cell's `get_text()`, tab-separated and newline-terminated.
    pub fn print_texts(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        crate::printer::print_texts(self, out)
    }

    // -- internal helpers --------------------------------------------------

    fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.values
            .get(pos.row as usize)?
            .get(pos.col as usize)?
            .cell
            .as_ref()
    }

    fn back_refs_at(&self, pos: Position) -> Option<&HashSet<Position>> {
        self.values
            .get(pos.row as usize)?
            .get(pos.col as usize)?
            .back_refs
            .as_ref()
    }

    /// Extends storage to cover `pos`, updating the bounding-box counters
    /// the same way the row actually grew (see spec §4.4 step 2).
    fn grow_to(&mut self, pos: Position) {
        let row_idx = pos.row as usize;
        let col_idx = pos.col as usize;
        while self.values.len() <= row_idx {
            self.values.push(Vec::new());
        }
        let row = &mut self.values[row_idx];
        let needed_len = col_idx + 1;
        if needed_len > row.len() {
            row.resize_with(needed_len, CellSlot::default);
            if needed_len == self.width {
                self.max_width_rows += 1;
            } else if needed_len > self.width {
                self.width = needed_len;
                self.max_width_rows = 1;
            }
        }
    }

    fn materialize(&mut self, pos: Position) {
        let slot = &mut self.values[pos.row as usize][pos.col as usize];
        if slot.cell.is_none() {
            slot.cell = Some(Cell::Empty);
        }
    }

    /// `{pos} ∪ {cells reachable from pos by following back-references}` —
    /// the set a proposed formula at `pos` must not reference, or doing so
    /// would close a cycle. See spec §4.5.
    fn forbidden_set(&self, pos: Position) -> HashSet<Position> {
        let mut visited = HashSet::new();
        visited.insert(pos);
        let mut stack = vec![pos];
        while let Some(current) = stack.pop() {
            if let Some(back_refs) = self.back_refs_at(current) {
                for &next in back_refs {
                    if visited.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }
        visited
    }

    /// BFS over back-references starting at `pos`'s dependents, dropping
    /// each visited cell's cache; a cell whose cache was already absent
    /// prunes that branch, since nothing downstream of it can have cached
    /// a value either. `pos` itself was just overwritten by `set_cell` (its
    /// own cache is already gone or, for a non-formula cell, nonexistent),
    /// so the queue is seeded one level down rather than gating on `pos`'s
    /// own `clear_cache()` result.
    fn invalidate_caches(&self, pos: Position) {
        let mut queue = VecDeque::new();
        if let Some(back_refs) = self.back_refs_at(pos) {
            queue.extend(back_refs.iter().copied());
        }
        while let Some(current) = queue.pop_front() {
            if let Some(cell) = self.cell_at(current) {
                if cell.clear_cache() {
                    if let Some(back_refs) = self.back_refs_at(current) {
                        queue.extend(back_refs.iter().copied());
                    }
                }
            }
        }
    }

    fn remove_back_ref(&mut self, at: Position, referrer: Position) {
        let row_idx = at.row as usize;
        let col_idx = at.col as usize;
        if let Some(slot) = self.values.get_mut(row_idx).and_then(|r| r.get_mut(col_idx)) {
            if let Some(back_refs) = slot.back_refs.as_mut() {
                back_refs.remove(&referrer);
                if back_refs.is_empty() {
                    slot.back_refs = None;
                }
            }
        }
    }

    fn add_back_ref(&mut self, at: Position, referrer: Position) {
        let row_idx = at.row as usize;
        let col_idx = at.col as usize;
        let slot = &mut self.values[row_idx][col_idx];
        slot.back_refs.get_or_insert_with(HashSet::new).insert(referrer);
    }

    /// Trims trailing unmaterialized slots from `row_idx`, then — if that
    /// row was the last one and is now empty — trims trailing empty rows.
    fn shrink_row(&mut self, row_idx: usize) {
        let row = &mut self.values[row_idx];
        while matches!(row.last(), Some(slot) if slot.cell.is_none()) {
            row.pop();
        }
        if row_idx == self.values.len() - 1 {
            while matches!(self.values.last(), Some(row) if row.is_empty()) {
                self.values.pop();
            }
        }
    }

    /// Full rescan used only when `max_width_rows` has dropped to zero and
    /// the incremental bookkeeping can no longer tell us the new width.
    fn rescan_bounding_box(&mut self) {
        let max_len = self.values.iter().map(Vec::len).max().unwrap_or(0);
        self.width = max_len;
        self.max_width_rows = self.values.iter().filter(|r| r.len() == max_len).count();
    }
}

impl SheetView for Sheet {
    fn get_cell_value(&self, pos: Position) -> SheetValue {
        match self.cell_at(pos) {
            None | Some(Cell::Empty) => SheetValue::Empty,
            Some(cell) => match cell.get_value(self) {
                CellValue::Text(s) => SheetValue::Text(s),
                CellValue::Number(n) => SheetValue::Number(n),
                CellValue::Error(e) => SheetValue::Error(e),
            },
        }
    }
}
