//! gridlock_engine - Cell model, formula evaluation and recalculation.

pub mod engine;
