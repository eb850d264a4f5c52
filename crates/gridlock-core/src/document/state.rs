use std::collections::{BTreeMap, HashMap};

use gridlock_engine::engine::{CellRef, Formula};
use serde::{Deserialize, Serialize};

/// The shared copy of a sheet that editors lock, update and poll.
///
/// Only formulas are stored; values are recomputed by each client. Cells with
/// no formula are absent from `cells`.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub(crate) name: String,
    /// Incremented exactly once per committed update. Never decremented.
    pub(crate) version: u64,
    /// At most one holder per cell. No lease: a lock lives until its holder
    /// releases it.
    pub(crate) locks: HashMap<CellRef, String>,
    pub(crate) cells: BTreeMap<CellRef, Formula>,
}

/// Every formula in a document together with the version it reflects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub cells: BTreeMap<CellRef, Formula>,
}

impl Document {
    /// Create an empty document at version 0.
    pub fn new(name: impl Into<String>) -> Self {
        Document {
            name: name.into(),
            ..Document::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn formula(&self, cell: &CellRef) -> Option<&Formula> {
        self.cells.get(cell)
    }

    /// Current formulas, paired with the version they belong to.
    pub fn full_state(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            cells: self.cells.clone(),
        }
    }

    /// Identity of the user editing `cell`, if any.
    pub fn lock_status(&self, cell: &CellRef) -> Option<&str> {
        self.locks.get(cell).map(String::as_str)
    }

    pub fn locked_cells(&self) -> impl Iterator<Item = (&CellRef, &str)> {
        self.locks.iter().map(|(cell, user)| (cell, user.as_str()))
    }
}
