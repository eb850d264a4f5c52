//! Cell data structures for the spreadsheet grid.
//!
//! A [`Cell`] owns its formula tokens. Everything else on it (value, error,
//! dependency set) is derived state written by the recalculation pass.

use std::collections::BTreeSet;

use super::cell_ref::CellRef;
use super::error::FormulaError;
use super::format::format_number;
use super::token::Formula;

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub cell_ref: CellRef,
    pub formula: Formula,
    /// Cached result of the last evaluation. `None` means the cell has not
    /// produced a value in the current pass (empty formula or not yet reached).
    pub value: Option<f64>,
    pub error: Option<FormulaError>,
    /// Cells referenced by `formula` as of the last dependency extraction.
    pub depends_on: BTreeSet<CellRef>,
    /// User currently editing this cell, as last reported by the server.
    pub lock_holder: Option<String>,
}

impl Cell {
    pub fn new_empty(cell_ref: CellRef) -> Cell {
        Cell {
            cell_ref,
            formula: Vec::new(),
            value: None,
            error: None,
            depends_on: BTreeSet::new(),
            lock_holder: None,
        }
    }

    pub fn label(&self) -> String {
        self.cell_ref.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.formula.is_empty()
    }

    /// Error code, or "" when the cell has none.
    pub fn error_string(&self) -> String {
        self.error.map(|e| e.to_string()).unwrap_or_default()
    }

    /// String shown for this cell in the grid.
    pub fn display_string(&self) -> String {
        if self.formula.is_empty() {
            return String::new();
        }
        if let Some(err) = self.error {
            return err.to_string();
        }
        self.value.map(format_number).unwrap_or_default()
    }

    /// Drop evaluation results so the next pass starts from the sentinel.
    pub(crate) fn reset_value(&mut self) {
        self.value = None;
        self.error = None;
    }
}
