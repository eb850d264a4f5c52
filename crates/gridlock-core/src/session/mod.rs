//! Client-side editing session.
//!
//! A [`SpreadSheetController`] owns a local [`Sheet`](gridlock_engine::engine::Sheet)
//! and talks to the shared document through a [`SheetService`].

mod builder;
mod controller;
mod service;

pub use builder::FormulaBuilder;
pub use controller::SpreadSheetController;
pub use service::{LocalService, SheetService};
