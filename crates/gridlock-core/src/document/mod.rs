//! Server-side document state and the per-cell locking protocol.

mod ops;
mod state;

pub use state::{Document, Snapshot};
