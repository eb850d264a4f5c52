//! gridlock-core - UI-agnostic documents, cell locking protocol and editing sessions.

pub mod document;
pub mod error;
pub mod protocol;
pub mod session;
pub mod store;

pub use document::{Document, Snapshot};
pub use error::{GridlockError, Result};
pub use session::{LocalService, SheetService, SpreadSheetController};
pub use store::DocumentStore;

pub use gridlock_engine::engine::{CellRef, Formula};
