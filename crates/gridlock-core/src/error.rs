//! Error types for Gridlock core.

use gridlock_engine::engine::{CellRef, SheetError};
use thiserror::Error;

/// Errors returned by documents, the store and editing sessions.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum GridlockError {
    /// The holder is reported so the requester can ask them to finish.
    #[error("Cell {cell} is being edited by {holder}")]
    CellAlreadyLocked { cell: CellRef, holder: String },

    #[error("Cell {cell} is not locked by the requesting user")]
    LockNotHeld { cell: CellRef },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

pub type Result<T> = std::result::Result<T, GridlockError>;
