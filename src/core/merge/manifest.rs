//! Versioned table manifests
//!
//! Each merged table carries an explicit column manifest persisted in the
//! `merge_manifest` meta table. Destination shape comes from the manifest,
//! never from sniffing the live table, and every schema change is a recorded
//! migration that bumps the manifest version.

use crate::core::merge::row::{MergeRow, Value, PROCESSED_AT};
use crate::domain::StoreError;
use serde::{Deserialize, Serialize};

/// Declared storage type of a manifest column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Timestamp,
}

impl ColumnType {
    /// SQLite column affinity for this type
    ///
    /// Timestamps are stored as text so their order comparisons stay
    /// chronological.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text | ColumnType::Timestamp => "TEXT",
        }
    }

    fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
            Value::Null => None,
        }
    }
}

/// One declared column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

/// The declared shape of one merged table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableManifest {
    pub table: String,
    pub version: u32,
    pub columns: Vec<ColumnSpec>,
}

impl TableManifest {
    /// Infers a version-1 manifest from a batch of rows
    ///
    /// Column types come from the first non-null value observed per column;
    /// a column that is null in every row defaults to text. A column is
    /// nullable when any row holds null for it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBatch`] when the batch is empty.
    pub fn infer(table: &str, rows: &[MergeRow]) -> Result<Self, StoreError> {
        let first = rows
            .first()
            .ok_or_else(|| StoreError::InvalidBatch("cannot infer shape from no rows".into()))?;

        let mut columns = Vec::new();
        for column in first.columns() {
            columns.push(Self::infer_column(column, rows));
        }

        Ok(Self {
            table: table.to_string(),
            version: 1,
            columns,
        })
    }

    fn infer_column(name: &str, rows: &[MergeRow]) -> ColumnSpec {
        let column_type = rows
            .iter()
            .filter_map(|row| row.get(name).and_then(ColumnType::of_value))
            .next()
            .unwrap_or(ColumnType::Text);
        let nullable = name != PROCESSED_AT
            && rows
                .iter()
                .any(|row| row.get(name).map(Value::is_null).unwrap_or(true));

        ColumnSpec {
            name: name.to_string(),
            column_type,
            nullable,
        }
    }

    /// True when the manifest declares the column
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Declared column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Records a migration: appends the new columns and bumps the version
    ///
    /// Columns added after table creation are always nullable; pre-existing
    /// rows hold null (or a backfilled timestamp) for them.
    pub fn evolve(&mut self, added: Vec<ColumnSpec>) {
        for mut column in added {
            if !self.has_column(&column.name) {
                column.nullable = true;
                self.columns.push(column);
            }
        }
        self.version += 1;
    }

    /// Infers specs for incoming columns the manifest does not declare yet
    pub fn missing_columns(&self, rows: &[MergeRow]) -> Vec<ColumnSpec> {
        let Some(first) = rows.first() else {
            return Vec::new();
        };
        first
            .columns()
            .into_iter()
            .filter(|name| !self.has_column(name))
            .map(|name| Self::infer_column(name, rows))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows() -> Vec<MergeRow> {
        let ts = NaiveDate::from_ymd_opt(2025, 4, 17)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        vec![
            MergeRow::new()
                .set("agency_code", "000153")
                .set("net", 10.5)
                .set("attempts", 1_i64)
                .set(PROCESSED_AT, ts),
            MergeRow::new()
                .set("agency_code", "000154")
                .set("net", Value::Null)
                .set("attempts", 2_i64)
                .set(PROCESSED_AT, ts),
        ]
    }

    #[test]
    fn test_infer_types_and_nullability() {
        let manifest = TableManifest::infer("valid_tickets", &rows()).unwrap();
        assert_eq!(manifest.version, 1);
        assert_eq!(
            manifest.column_names(),
            vec!["agency_code", "net", "attempts", PROCESSED_AT]
        );

        let net = manifest.columns.iter().find(|c| c.name == "net").unwrap();
        assert_eq!(net.column_type, ColumnType::Float);
        assert!(net.nullable);

        let code = manifest
            .columns
            .iter()
            .find(|c| c.name == "agency_code")
            .unwrap();
        assert_eq!(code.column_type, ColumnType::Text);
        assert!(!code.nullable);

        let ts = manifest
            .columns
            .iter()
            .find(|c| c.name == PROCESSED_AT)
            .unwrap();
        assert_eq!(ts.column_type, ColumnType::Timestamp);
        assert!(!ts.nullable);
    }

    #[test]
    fn test_infer_rejects_empty_batch() {
        let err = TableManifest::infer("valid_tickets", &[]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidBatch(_)));
    }

    #[test]
    fn test_evolve_bumps_version_and_appends() {
        let mut manifest = TableManifest::infer("valid_tickets", &rows()).unwrap();
        manifest.evolve(vec![ColumnSpec {
            name: "observation".to_string(),
            column_type: ColumnType::Text,
            nullable: false,
        }]);
        assert_eq!(manifest.version, 2);
        let added = manifest
            .columns
            .iter()
            .find(|c| c.name == "observation")
            .unwrap();
        assert!(added.nullable);
    }

    #[test]
    fn test_missing_columns() {
        let manifest = TableManifest::infer("valid_tickets", &rows()).unwrap();
        let wider = vec![rows().remove(0).set("observation", "nothing to report")];
        let missing = manifest.missing_columns(&wider);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "observation");
    }

    #[test]
    fn test_manifest_round_trips_as_json() {
        let manifest = TableManifest::infer("valid_tickets", &rows()).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        let back: TableManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
