//! Registry of named documents.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::document::Document;
use crate::error::{GridlockError, Result};

/// Named documents, each mutated under its own shard lock.
///
/// Requests against one document are serialised; requests against different
/// documents do not contend.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<String, Document>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GridlockError::InvalidRequest("document name must not be empty".into()));
    }
    Ok(())
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `name`, or open it if it already exists.
    ///
    /// Returns true when a new document was created.
    pub fn create(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        match self.documents.entry(name.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(Document::new(name));
                tracing::info!(document = name, "document created");
                Ok(true)
            }
        }
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        match self.documents.remove(name) {
            Some(_) => {
                tracing::info!(document = name, "document deleted");
                Ok(())
            }
            None => Err(GridlockError::DocumentNotFound(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    /// Document names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.documents.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Run `f` with exclusive access to the named document.
    pub fn with_document<R>(&self, name: &str, f: impl FnOnce(&mut Document) -> R) -> Result<R> {
        validate_name(name)?;
        let mut doc = self
            .documents
            .get_mut(name)
            .ok_or_else(|| GridlockError::DocumentNotFound(name.to_string()))?;
        Ok(f(doc.value_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_engine::engine::CellRef;

    #[test]
    fn test_create_is_idempotent() {
        let store = DocumentStore::new();
        assert_eq!(store.create("budget"), Ok(true));
        store
            .with_document("budget", |doc| doc.lock_cell(CellRef::new(0, 0), "alice"))
            .unwrap()
            .unwrap();

        assert_eq!(store.create("budget"), Ok(false));
        let holder = store
            .with_document("budget", |doc| doc.lock_status(&CellRef::new(0, 0)).map(str::to_string))
            .unwrap();
        assert_eq!(holder.as_deref(), Some("alice"));
    }

    #[test]
    fn test_names_are_sorted() {
        let store = DocumentStore::new();
        for name in ["zeta", "alpha", "mid"] {
            store.create(name).unwrap();
        }
        assert_eq!(store.names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_delete_and_missing_documents() {
        let store = DocumentStore::new();
        store.create("tmp").unwrap();
        assert_eq!(store.delete("tmp"), Ok(()));
        assert!(!store.contains("tmp"));
        assert_eq!(store.delete("tmp"), Err(GridlockError::DocumentNotFound("tmp".into())));
        assert!(matches!(
            store.with_document("tmp", |doc| doc.version()),
            Err(GridlockError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let store = DocumentStore::new();
        assert!(matches!(store.create(""), Err(GridlockError::InvalidRequest(_))));
        assert!(store.names().is_empty());
    }
}
