//! Spreadsheet engine API.
//!
//! This module provides the computation side of a sheet:
//!
//! - [`Cell`], [`Sheet`] - Data structures for cell storage
//! - [`CellRef`] - Cell labels (A1 notation ↔ row/col indices)
//! - [`Token`], [`Operator`] - Classification of formula tokens
//! - [`FormulaEvaluator`] - Recursive-descent evaluation of one formula
//! - [`can_add_dependency`], [`detect_cycle`] - Circular reference checks
//! - [`CalculationManager`] - Dependency ordering and whole-sheet recalculation
//! - [`format_number`] - Format values for display

mod calc;
mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod format;
mod sheet;
mod token;

pub use calc::{CalculationManager, computation_order};
pub use cell::Cell;
pub use cell_ref::{CellRef, MAX_COLUMNS};
pub use cycle::{can_add_dependency, detect_cycle};
pub use deps::extract_dependencies;
pub use error::{FormulaError, SheetError};
pub use eval::{CellSource, Evaluation, FormulaEvaluator, RandomSource};
pub use format::format_number;
pub use sheet::{MAX_ROWS, Sheet};
pub use token::{Formula, Operator, Token};
