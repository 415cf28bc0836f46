//! CSV snapshot export
//!
//! Writes the full contents of a store table to a deterministic per-date CSV
//! file. Export failures are logged and reported as "no file"; they never
//! fail the surrounding run.

use crate::core::merge::{MergeStore, Value};
use crate::domain::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes per-table CSV snapshots into a fixed output directory
pub struct SnapshotExporter {
    output_dir: PathBuf,
}

impl SnapshotExporter {
    /// Creates an exporter rooted at the given directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Exports one table as `<table>_<YYYYMMDD>.csv`
    ///
    /// Returns the written path, or `None` when the export failed (already
    /// logged).
    pub fn export_table(
        &self,
        store: &MergeStore,
        table: &str,
        date: NaiveDate,
    ) -> Option<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{table}_{}.csv", date.format("%Y%m%d")));

        match self.write_snapshot(store, table, &path) {
            Ok(rows) => {
                tracing::info!(table = table, path = %path.display(), rows = rows, "Exported snapshot");
                Some(path)
            }
            Err(e) => {
                tracing::error!(table = table, error = %e, "Snapshot export failed");
                None
            }
        }
    }

    fn write_snapshot(&self, store: &MergeStore, table: &str, path: &Path) -> Result<usize> {
        let snapshot = store.snapshot(table)?;
        fs::create_dir_all(&self.output_dir)?;

        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| crate::domain::SettlecheckError::Export(e.to_string()))?;
        writer
            .write_record(&snapshot.columns)
            .map_err(|e| crate::domain::SettlecheckError::Export(e.to_string()))?;
        for row in &snapshot.rows {
            let record: Vec<String> = row.iter().map(render_cell).collect();
            writer
                .write_record(&record)
                .map_err(|e| crate::domain::SettlecheckError::Export(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| crate::domain::SettlecheckError::Export(e.to_string()))?;

        Ok(snapshot.rows.len())
    }
}

/// Renders one cell for CSV output
///
/// Semicolons are stripped from text so the files survive spreadsheet tools
/// configured with a semicolon list separator.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::Float(v) => format!("{v:.2}"),
        Value::Text(v) => v.replace(';', ""),
        Value::Timestamp(v) => v.format(crate::core::merge::TIMESTAMP_FORMAT).to_string(),
        Value::Null => String::new(),
    }
}
