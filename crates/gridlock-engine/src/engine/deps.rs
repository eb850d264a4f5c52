//! Dependency extraction from formula tokens.
//!
//! A formula depends on every token that is syntactically a cell label.
//! Whether the cell exists in a given sheet is decided later, when the
//! dependency is read.

use std::collections::BTreeSet;

use super::cell_ref::CellRef;
use super::token::Token;

/// Extract the set of cells a formula references.
pub fn extract_dependencies(formula: &[String]) -> BTreeSet<CellRef> {
    formula
        .iter()
        .filter_map(|token| match Token::parse(token) {
            Token::Cell(cell_ref) => Some(cell_ref),
            _ => None,
        })
        .collect()
}
