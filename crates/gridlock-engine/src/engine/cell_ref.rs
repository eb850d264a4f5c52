//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between cell labels (e.g., "A1", "C12")
//! and zero-indexed column/row coordinates. Labels are a single uppercase
//! column letter followed by a 1-based row number, so a sheet is at most
//! [`MAX_COLUMNS`] wide.
//!
//! # Examples
//!
//! ```
//! use gridlock_engine::engine::CellRef;
//!
//! let cell = CellRef::from_label("B3").unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of addressable columns (`A` through `Z`).
pub const MAX_COLUMNS: usize = 26;

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is row-major, which is also the order cells are visited when the
/// whole sheet is walked. On the wire a `CellRef` is its label.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell label such as "A1" or "Z40".
    /// Returns None if the input is not a valid label.
    pub fn from_label(label: &str) -> Option<CellRef> {
        let caps = label_re().captures(label)?;
        let col = (caps["col"].as_bytes()[0] - b'A') as usize;
        let row = caps["row"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// True when `label` is syntactically a cell label.
    pub fn is_valid_label(label: &str) -> bool {
        Self::from_label(label).is_some()
    }

    /// Column letter for an index (0 -> A, 25 -> Z).
    pub fn col_to_letter(col: usize) -> Option<char> {
        (col < MAX_COLUMNS).then(|| (b'A' + col as u8) as char)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

fn label_re() -> &'static Regex {
    static LABEL_RE: OnceLock<Regex> = OnceLock::new();
    LABEL_RE.get_or_init(|| {
        Regex::new(r"^(?<col>[A-Z])(?<row>[1-9][0-9]*)$").expect("cell label regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl TryFrom<String> for CellRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRef> for String {
    fn from(cell: CellRef) -> String {
        cell.to_string()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match CellRef::col_to_letter(self.col) {
            Some(letter) => write!(f, "{}{}", letter, self.row + 1),
            // Out-of-range columns never come from a label; keep Display total anyway.
            None => write!(f, "#{}:{}", self.col, self.row + 1),
        }
    }
}
