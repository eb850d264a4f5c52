use std::sync::Arc;

use gridlock_engine::engine::CellRef;

use crate::document::Snapshot;
use crate::error::Result;
use crate::store::DocumentStore;

/// Operations an editing session needs from the shared document.
///
/// Every call may cross a process boundary; a failed call leaves the
/// session's local state unchanged.
pub trait SheetService {
    fn lock_cell(&self, cell: CellRef, user: &str) -> Result<()>;
    fn unlock_cell(&self, cell: CellRef, user: &str) -> Result<()>;
    /// Commit `formula` and return the new document version.
    fn update_cell(&self, cell: CellRef, formula: &[String], user: &str) -> Result<u64>;
    fn version(&self) -> Result<u64>;
    fn full_state(&self) -> Result<Snapshot>;
    fn lock_status(&self, cell: CellRef) -> Result<Option<String>>;
}

/// In-process service backed by a shared [`DocumentStore`].
#[derive(Clone, Debug)]
pub struct LocalService {
    store: Arc<DocumentStore>,
    document: String,
}

impl LocalService {
    pub fn new(store: Arc<DocumentStore>, document: impl Into<String>) -> Self {
        LocalService {
            store,
            document: document.into(),
        }
    }

    /// Service for `document`, creating the document if needed.
    pub fn open(store: Arc<DocumentStore>, document: impl Into<String>) -> Result<Self> {
        let service = Self::new(store, document);
        service.store.create(&service.document)?;
        Ok(service)
    }

    pub fn document(&self) -> &str {
        &self.document
    }
}

impl SheetService for LocalService {
    fn lock_cell(&self, cell: CellRef, user: &str) -> Result<()> {
        self.store.with_document(&self.document, |doc| doc.lock_cell(cell, user))?
    }

    fn unlock_cell(&self, cell: CellRef, user: &str) -> Result<()> {
        self.store.with_document(&self.document, |doc| doc.unlock_cell(cell, user))?
    }

    fn update_cell(&self, cell: CellRef, formula: &[String], user: &str) -> Result<u64> {
        self.store
            .with_document(&self.document, |doc| doc.update_cell(cell, formula.to_vec(), user))?
    }

    fn version(&self) -> Result<u64> {
        self.store.with_document(&self.document, |doc| doc.version())
    }

    fn full_state(&self) -> Result<Snapshot> {
        self.store.with_document(&self.document, |doc| doc.full_state())
    }

    fn lock_status(&self, cell: CellRef) -> Result<Option<String>> {
        self.store
            .with_document(&self.document, |doc| doc.lock_status(&cell).map(str::to_string))
    }
}
