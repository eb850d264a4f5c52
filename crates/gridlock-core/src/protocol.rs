//! Request/response wire format for shared documents.
//!
//! Messages are JSON objects tagged by `"type"`. A transport carries one
//! request per line and answers each with exactly one response line:
//!
//! ```text
//! {"type":"lock_cell","document":"budget","cell":"A1","user":"alice"}
//! {"type":"locked","document":"budget","cell":"A1"}
//! ```

use std::collections::BTreeMap;

use gridlock_engine::engine::{CellRef, Formula};
use serde::{Deserialize, Serialize};

use crate::error::GridlockError;
use crate::store::DocumentStore;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    CreateDocument {
        document: String,
    },
    DeleteDocument {
        document: String,
    },
    ListDocuments,
    SheetState {
        document: String,
    },
    LockCell {
        document: String,
        cell: CellRef,
        user: String,
    },
    UnlockCell {
        document: String,
        cell: CellRef,
        user: String,
    },
    UpdateCell {
        document: String,
        cell: CellRef,
        formula: Formula,
        user: String,
    },
    GetVersion {
        document: String,
    },
    CellStatus {
        document: String,
        cell: CellRef,
    },
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Created {
        document: String,
    },
    Deleted {
        document: String,
    },
    Documents {
        names: Vec<String>,
    },
    /// Every formula in the document and the version it reflects.
    SheetState {
        version: u64,
        cells: BTreeMap<CellRef, Formula>,
    },
    Locked {
        document: String,
        cell: CellRef,
    },
    Unlocked {
        document: String,
        cell: CellRef,
    },
    Updated {
        cell: CellRef,
        formula: Formula,
        version: u64,
    },
    Version {
        version: u64,
    },
    CellStatus {
        cell: CellRef,
        editing_by: Option<String>,
    },
    Error {
        kind: ErrorKind,
        message: String,
        /// Set for lock conflicts.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        editing_by: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CellAlreadyLocked,
    LockNotHeld,
    InvalidRequest,
    DocumentNotFound,
}

impl ErrorKind {
    /// HTTP status a web transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::CellAlreadyLocked | ErrorKind::InvalidRequest => 400,
            ErrorKind::LockNotHeld => 403,
            ErrorKind::DocumentNotFound => 404,
        }
    }
}

impl From<&GridlockError> for ErrorKind {
    fn from(err: &GridlockError) -> Self {
        match err {
            GridlockError::CellAlreadyLocked { .. } => ErrorKind::CellAlreadyLocked,
            GridlockError::LockNotHeld { .. } => ErrorKind::LockNotHeld,
            GridlockError::InvalidRequest(_) | GridlockError::Sheet(_) => ErrorKind::InvalidRequest,
            GridlockError::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
        }
    }
}

impl From<GridlockError> for Response {
    fn from(err: GridlockError) -> Self {
        let editing_by = match &err {
            GridlockError::CellAlreadyLocked { holder, .. } => Some(holder.clone()),
            _ => None,
        };
        Response::Error {
            kind: ErrorKind::from(&err),
            message: err.to_string(),
            editing_by,
        }
    }
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Status code for this response: 200 unless it is an error.
    pub fn status_code(&self) -> u16 {
        match self {
            Response::Error { kind, .. } => kind.status_code(),
            _ => 200,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Apply one request to the store.
pub fn handle(store: &DocumentStore, request: Request) -> Response {
    dispatch(store, request).unwrap_or_else(Response::from)
}

/// Parse and apply one JSON request. Malformed input yields an
/// `invalid_request` error response.
pub fn handle_json(store: &DocumentStore, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle(store, request),
        Err(err) => {
            tracing::debug!("rejecting malformed request: {}", err);
            GridlockError::InvalidRequest(err.to_string()).into()
        }
    }
}

fn dispatch(store: &DocumentStore, request: Request) -> crate::Result<Response> {
    let response = match request {
        Request::CreateDocument { document } => {
            store.create(&document)?;
            Response::Created { document }
        }
        Request::DeleteDocument { document } => {
            store.delete(&document)?;
            Response::Deleted { document }
        }
        Request::ListDocuments => Response::Documents {
            names: store.names(),
        },
        Request::SheetState { document } => {
            let state = store.with_document(&document, |doc| doc.full_state())?;
            Response::SheetState {
                version: state.version,
                cells: state.cells,
            }
        }
        Request::LockCell {
            document,
            cell,
            user,
        } => {
            store.with_document(&document, |doc| doc.lock_cell(cell, &user))??;
            Response::Locked { document, cell }
        }
        Request::UnlockCell {
            document,
            cell,
            user,
        } => {
            store.with_document(&document, |doc| doc.unlock_cell(cell, &user))??;
            Response::Unlocked { document, cell }
        }
        Request::UpdateCell {
            document,
            cell,
            formula,
            user,
        } => {
            let version = store
                .with_document(&document, |doc| doc.update_cell(cell, formula.clone(), &user))??;
            Response::Updated {
                cell,
                formula,
                version,
            }
        }
        Request::GetVersion { document } => Response::Version {
            version: store.with_document(&document, |doc| doc.version())?,
        },
        Request::CellStatus { document, cell } => Response::CellStatus {
            cell,
            editing_by: store
                .with_document(&document, |doc| doc.lock_status(&cell).map(str::to_string))?,
        },
    };
    Ok(response)
}
