//! Generic merge engine over the embedded SQLite store

pub mod manifest;
pub mod row;
pub mod store;

pub use manifest::{ColumnSpec, ColumnType, TableManifest};
pub use row::{MergeRow, Value, PROCESSED_AT, TIMESTAMP_FORMAT};
pub use store::{MergeOptions, MergeStore, TableSnapshot};
