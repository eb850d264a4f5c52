//! Fixed-size grid of cells.
//!
//! Cells live in one row-major `Vec` addressed by [`CellRef`]; labels are
//! only a presentation of coordinates. Dimensions never change after
//! construction.

use std::collections::BTreeMap;

use super::cell::Cell;
use super::cell_ref::{CellRef, MAX_COLUMNS};
use super::error::{FormulaError, SheetError};
use super::eval::CellSource;
use super::token::Formula;

/// Largest number of rows a sheet may have.
pub const MAX_ROWS: usize = 10_000;

#[derive(Clone, Debug)]
pub struct Sheet {
    cells: Vec<Cell>,
    columns: usize,
    rows: usize,
    working: CellRef,
    needs_recalc: bool,
}

impl Sheet {
    pub fn new(columns: usize, rows: usize) -> Result<Sheet, SheetError> {
        if columns == 0 || columns > MAX_COLUMNS {
            return Err(SheetError::InvalidColumns(columns));
        }
        if rows == 0 || rows > MAX_ROWS {
            return Err(SheetError::InvalidRows(rows));
        }
        let cells = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| Cell::new_empty(CellRef::new(col, row))))
            .collect();
        Ok(Sheet {
            cells,
            columns,
            rows,
            working: CellRef::new(0, 0),
            needs_recalc: false,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn contains(&self, cell_ref: &CellRef) -> bool {
        cell_ref.col < self.columns && cell_ref.row < self.rows
    }

    fn index(&self, cell_ref: &CellRef) -> Option<usize> {
        self.contains(cell_ref)
            .then(|| cell_ref.row * self.columns + cell_ref.col)
    }

    /// Resolve a label to a coordinate inside this sheet.
    pub fn resolve(&self, label: &str) -> Result<CellRef, SheetError> {
        let cell_ref =
            CellRef::from_label(label).ok_or_else(|| SheetError::InvalidLabel(label.to_string()))?;
        if !self.contains(&cell_ref) {
            return Err(SheetError::OutOfBounds(label.to_string()));
        }
        Ok(cell_ref)
    }

    pub fn cell(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.index(cell_ref).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, cell_ref: &CellRef) -> Option<&mut Cell> {
        self.index(cell_ref).map(|i| &mut self.cells[i])
    }

    pub fn cell_by_label(&self, label: &str) -> Option<&Cell> {
        self.cell(&CellRef::from_label(label)?)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub fn cell_refs(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.cells.iter().map(|c| c.cell_ref)
    }

    pub fn working_cell(&self) -> CellRef {
        self.working
    }

    pub fn set_working_cell(&mut self, cell_ref: CellRef) -> Result<(), SheetError> {
        if !self.contains(&cell_ref) {
            return Err(SheetError::OutOfBounds(cell_ref.to_string()));
        }
        self.working = cell_ref;
        Ok(())
    }

    pub fn working_formula(&self) -> &[String] {
        &self.cells[self.working.row * self.columns + self.working.col].formula
    }

    pub fn set_working_formula(&mut self, formula: Formula) {
        let working = self.working;
        self.set_formula(&working, formula);
    }

    /// Replace a cell's formula. Out-of-sheet references are ignored.
    pub fn set_formula(&mut self, cell_ref: &CellRef, formula: Formula) {
        if let Some(cell) = self.cell_mut(cell_ref)
            && cell.formula != formula
        {
            cell.formula = formula;
            self.needs_recalc = true;
        }
    }

    /// Load a full snapshot of formulas. Cells missing from `snapshot` become
    /// empty; `keep` names a cell whose local formula must survive (the one
    /// being edited).
    pub fn load_formulas(&mut self, snapshot: &BTreeMap<CellRef, Formula>, keep: Option<CellRef>) {
        for cell_ref in snapshot.keys().filter(|c| !self.contains(c)) {
            tracing::warn!(
                "snapshot cell {} is outside the {}x{} sheet",
                cell_ref,
                self.columns,
                self.rows
            );
        }

        let mut changed = false;
        for cell in self.cells.iter_mut() {
            if Some(cell.cell_ref) == keep {
                continue;
            }
            let incoming = snapshot.get(&cell.cell_ref).map(Vec::as_slice).unwrap_or(&[]);
            if cell.formula != incoming {
                cell.formula = incoming.to_vec();
                changed = true;
            }
        }
        if changed {
            self.needs_recalc = true;
        }
    }

    /// Non-empty formulas keyed by cell, the same shape as a server snapshot.
    pub fn formulas(&self) -> BTreeMap<CellRef, Formula> {
        self.cells
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| (c.cell_ref, c.formula.clone()))
            .collect()
    }

    pub fn needs_recalc(&self) -> bool {
        self.needs_recalc
    }

    pub fn reset_recalc(&mut self) {
        self.needs_recalc = false;
    }

    /// Display strings, `[row][column]`.
    pub fn display_strings(&self) -> Vec<Vec<String>> {
        self.cells
            .chunks(self.columns)
            .map(|row| row.iter().map(Cell::display_string).collect())
            .collect()
    }
}

impl CellSource for Sheet {
    fn cell_value(&self, cell_ref: &CellRef) -> Result<f64, FormulaError> {
        let cell = self.cell(cell_ref).ok_or(FormulaError::InvalidCell)?;
        if cell.is_empty() {
            return Err(FormulaError::InvalidCell);
        }
        if let Some(err) = cell.error {
            return Err(err);
        }
        cell.value.ok_or(FormulaError::InvalidCell)
    }
}
