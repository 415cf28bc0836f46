//! Reconciliation engine and its helpers

pub mod categories;
pub mod engine;
pub mod money;

pub use categories::CategoryMatcher;
pub use engine::{ReconcileEngine, RunOutcomes};
