//! Error types for formula evaluation and sheet construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evaluation errors cached on a cell.
///
/// The `Display` form is the code shown in place of a value. Once an
/// evaluation records one of these it is never overwritten in that pass.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaError {
    #[error("#EMPTY!")]
    EmptyFormula,
    #[error("#ERR")]
    InvalidFormula,
    #[error("#DIV/0!")]
    DivideByZero,
    #[error("#NUM!")]
    NegativeRoot,
    #[error("#UNDEF!")]
    Tan90,
    #[error("#VALUE!")]
    InvalidInput,
    #[error("#ERR")]
    MissingParentheses,
    #[error("#REF!")]
    InvalidCell,
    /// Tokens ran out while a factor was expected. Escalated to
    /// [`FormulaError::InvalidFormula`] before an evaluation is returned.
    #[error("#ERR")]
    Partial,
}

/// Errors from building or addressing a [`Sheet`](super::Sheet).
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SheetError {
    #[error("Sheet must have 1..=26 columns, got {0}")]
    InvalidColumns(usize),

    #[error("Sheet must have 1..=10000 rows, got {0}")]
    InvalidRows(usize),

    #[error("Invalid cell reference: {0}")]
    InvalidLabel(String),

    #[error("Cell {0} is outside the sheet")]
    OutOfBounds(String),
}
