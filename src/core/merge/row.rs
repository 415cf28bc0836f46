//! Merge-row value model
//!
//! The merge engine is generic over row shape: a row is an ordered list of
//! (column, value) pairs and carries no knowledge of what it represents.
//! Timestamps are stored as text in a fixed microsecond format whose
//! lexicographic order equals chronological order, so the recency gate can be
//! expressed as a plain string comparison in SQL.

use chrono::NaiveDateTime;
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::ToSql;

/// Column holding the recency timestamp on every merged row
pub const PROCESSED_AT: &str = "processed_at";

/// Storage format for timestamp values
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A single typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Null,
}

impl Value {
    /// True for the Null variant
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Text(v) => ToSqlOutput::Owned(SqlValue::Text(v.clone())),
            Value::Timestamp(v) => {
                ToSqlOutput::Owned(SqlValue::Text(v.format(TIMESTAMP_FORMAT).to_string()))
            }
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

/// One incoming row: ordered (column, value) pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeRow {
    cells: Vec<(String, Value)>,
}

impl MergeRow {
    /// Creates an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cell, replacing any existing cell with the same column name
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        if let Some(cell) = self.cells.iter_mut().find(|(name, _)| *name == column) {
            cell.1 = value;
        } else {
            self.cells.push((column, value));
        }
        self
    }

    /// The value stored under a column, if present
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in declaration order
    pub fn columns(&self) -> Vec<&str> {
        self.cells.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// True when the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_existing_column() {
        let row = MergeRow::new()
            .set("agency_code", "000153")
            .set("net", 10.0)
            .set("net", 12.5);
        assert_eq!(row.columns(), vec!["agency_code", "net"]);
        assert_eq!(row.get("net"), Some(&Value::Float(12.5)));
    }

    #[test]
    fn test_timestamp_text_order_is_chronological() {
        let early = chrono::NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_micro_opt(3, 0, 0, 1)
            .unwrap();
        let late = early + chrono::Duration::microseconds(1);
        let a = early.format(TIMESTAMP_FORMAT).to_string();
        let b = late.format(TIMESTAMP_FORMAT).to_string();
        assert!(a < b);
        assert_eq!(a, "2025-04-16 03:00:00.000001");
    }
}
