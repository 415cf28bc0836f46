//! Core engines: reconciliation, merge, export, run coordination

pub mod export;
pub mod merge;
pub mod reconcile;
pub mod run;
