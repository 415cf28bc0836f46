//! Timestamp-gated upsert into the local SQLite store
//!
//! One writer per table per run. A batch is registered as a temp relation,
//! then an update phase overwrites persisted rows whose stored `processed_at`
//! is strictly older than the incoming row's, and an insert phase appends the
//! rows with no match-tuple counterpart. Replaying the same batch is a no-op.

use crate::core::merge::manifest::{ColumnType, TableManifest};
use crate::core::merge::row::{MergeRow, Value, PROCESSED_AT, TIMESTAMP_FORMAT};
use crate::domain::{Result, StoreError};
use chrono::Utc;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;

/// Column selection options for one upsert call
///
/// `match_columns` and `exclude_columns` are mutually exclusive: either name
/// the match tuple explicitly, or name the columns to leave out of the
/// default tuple (all columns minus excludes minus the timestamp).
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub match_columns: Vec<String>,
    pub exclude_columns: Vec<String>,
    pub evolve_schema: bool,
}

/// Rendered contents of one table, used by the snapshot exporter
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Embedded SQLite store for reconciliation outcomes
pub struct MergeStore {
    conn: Connection,
}

impl MergeStore {
    /// Opens (or creates) the store at the given path
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OpenFailed`] when the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        let store = Self { conn };
        store.ensure_meta()?;
        Ok(store)
    }

    /// Opens an in-memory store
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        let store = Self { conn };
        store.ensure_meta()?;
        Ok(store)
    }

    fn ensure_meta(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS merge_manifest (
                table_name TEXT PRIMARY KEY,
                version    INTEGER NOT NULL,
                manifest   TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        Ok(())
    }

    /// Merges a batch of rows into a table
    ///
    /// Returns the number of affected rows (updated + inserted). The table
    /// and its manifest are created on first contact; afterwards the manifest
    /// is the single source of truth for the destination shape.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConflictingColumnOptions`] when both column
    /// options are set, and [`StoreError::InvalidBatch`] when the batch rows
    /// do not share one column shape or no usable match tuple remains.
    pub fn upsert(&mut self, table: &str, rows: Vec<MergeRow>, options: &MergeOptions) -> Result<usize> {
        if !options.match_columns.is_empty() && !options.exclude_columns.is_empty() {
            return Err(StoreError::ConflictingColumnOptions.into());
        }
        if rows.is_empty() {
            tracing::warn!(table = table, "Empty batch; nothing to merge");
            return Ok(0);
        }

        let now = Utc::now().naive_utc();
        let mut rows = rows;
        for row in rows.iter_mut() {
            if row.get(PROCESSED_AT).is_none() {
                let filled = std::mem::take(row).set(PROCESSED_AT, now);
                *row = filled;
            }
        }

        let shape: Vec<String> = rows[0].columns().iter().map(|s| s.to_string()).collect();
        for row in &rows[1..] {
            if row.columns() != shape.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(StoreError::InvalidBatch(
                    "batch rows do not share one column shape".into(),
                )
                .into());
            }
        }

        let manifest = match self.load_manifest(table)? {
            Some(manifest) => manifest,
            None => {
                let manifest = TableManifest::infer(table, &rows)?;
                self.create_table(&manifest)?;
                self.save_manifest(&manifest)?;
                tracing::info!(table = table, "Created table from inferred manifest");
                manifest
            }
        };

        let manifest = self.reconcile_shape(manifest, &rows, options.evolve_schema)?;

        // Unknown incoming columns survive evolution only when it is enabled;
        // otherwise they are left out of both phases.
        let effective: Vec<String> = shape
            .iter()
            .filter(|name| manifest.has_column(name))
            .cloned()
            .collect();
        if effective.len() < shape.len() {
            tracing::debug!(
                table = table,
                "Batch carries columns outside the manifest; ignoring them"
            );
        }

        let match_columns = self.resolve_match_columns(&effective, options)?;

        let batch = TempBatch::register(&self.conn, table, &manifest, &effective, &rows)?;
        let affected = self.merge_phases(table, &batch, &effective, &match_columns)?;

        tracing::info!(
            table = table,
            incoming = rows.len(),
            affected = affected,
            "Merged batch"
        );
        Ok(affected)
    }

    /// Renders the full contents of a table for export
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Manifest`] when the table was never merged into.
    pub fn snapshot(&self, table: &str) -> Result<TableSnapshot> {
        let manifest = self.load_manifest(table)?.ok_or_else(|| StoreError::Manifest {
            table: table.to_string(),
            message: "no manifest recorded".to_string(),
        })?;

        let columns: Vec<String> = manifest.column_names().iter().map(|s| s.to_string()).collect();
        let column_list = quoted_list(&columns);
        let sql = format!(
            "SELECT {column_list} FROM {} ORDER BY rowid",
            quote_ident(table)
        );

        let mut stmt = self.conn.prepare(&sql).map_err(StoreError::from)?;
        let mut sql_rows = stmt.query([]).map_err(StoreError::from)?;
        let mut rows = Vec::new();
        while let Some(row) = sql_rows.next().map_err(StoreError::from)? {
            let mut cells = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                cells.push(decode_cell(row.get_ref(idx).map_err(StoreError::from)?));
            }
            rows.push(cells);
        }

        Ok(TableSnapshot { columns, rows })
    }

    /// The manifest version currently recorded for a table
    pub fn manifest_version(&self, table: &str) -> Result<Option<u32>> {
        Ok(self.load_manifest(table)?.map(|m| m.version))
    }

    fn reconcile_shape(
        &self,
        mut manifest: TableManifest,
        rows: &[MergeRow],
        evolve: bool,
    ) -> Result<TableManifest> {
        let missing = manifest.missing_columns(rows);
        if missing.is_empty() || !evolve {
            return Ok(manifest);
        }

        let now_text = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
        for spec in &missing {
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quote_ident(&manifest.table),
                quote_ident(&spec.name),
                spec.column_type.sql_type()
            );
            self.conn.execute(&sql, []).map_err(StoreError::from)?;

            // Pre-existing rows get "now" for a new timestamp column so the
            // recency gate keeps working; other added columns stay null.
            if spec.column_type == ColumnType::Timestamp {
                let backfill = format!(
                    "UPDATE {} SET {} = ?1 WHERE {} IS NULL",
                    quote_ident(&manifest.table),
                    quote_ident(&spec.name),
                    quote_ident(&spec.name)
                );
                self.conn
                    .execute(&backfill, [&now_text])
                    .map_err(StoreError::from)?;
            }
        }

        let added: Vec<String> = missing.iter().map(|c| c.name.clone()).collect();
        manifest.evolve(missing);
        self.save_manifest(&manifest)?;
        tracing::info!(
            table = manifest.table,
            version = manifest.version,
            added = ?added,
            "Evolved table shape"
        );
        Ok(manifest)
    }

    fn resolve_match_columns(
        &self,
        effective: &[String],
        options: &MergeOptions,
    ) -> Result<Vec<String>> {
        let match_columns: Vec<String> = if options.match_columns.is_empty() {
            effective
                .iter()
                .filter(|name| {
                    name.as_str() != PROCESSED_AT && !options.exclude_columns.contains(name)
                })
                .cloned()
                .collect()
        } else {
            for name in &options.match_columns {
                if !effective.contains(name) {
                    return Err(StoreError::InvalidBatch(format!(
                        "match column '{name}' is not part of the batch shape"
                    ))
                    .into());
                }
            }
            options.match_columns.clone()
        };

        if match_columns.is_empty() {
            return Err(StoreError::InvalidBatch("no match columns remain".into()).into());
        }
        Ok(match_columns)
    }

    fn merge_phases(
        &self,
        table: &str,
        batch: &TempBatch<'_>,
        effective: &[String],
        match_columns: &[String],
    ) -> Result<usize> {
        let join = match_columns
            .iter()
            .map(|c| format!("dest.{q} = src.{q}", q = quote_ident(c)))
            .collect::<Vec<_>>()
            .join(" AND ");

        let set_columns: Vec<&String> = effective
            .iter()
            .filter(|c| c.as_str() != PROCESSED_AT && !match_columns.contains(c))
            .collect();

        let tx = self.conn.unchecked_transaction().map_err(StoreError::from)?;

        // Update phase: stored timestamp strictly older than incoming. The
        // stored timestamp itself is not refreshed.
        let updated = if set_columns.is_empty() {
            0
        } else {
            let assignments = set_columns
                .iter()
                .map(|c| format!("{q} = src.{q}", q = quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {dest} AS dest SET {assignments}
                   FROM {src} AS src
                  WHERE {join}
                    AND dest.{ts} < src.{ts}",
                dest = quote_ident(table),
                src = batch.name(),
                ts = quote_ident(PROCESSED_AT),
            );
            tx.execute(&sql, []).map_err(StoreError::from)?
        };

        // Insert phase: rows with no match-tuple counterpart. Destination
        // columns absent from the batch are left null.
        let column_list = quoted_list(effective);
        let select_list = effective
            .iter()
            .map(|c| format!("src.{}", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {dest} ({column_list})
             SELECT {select_list} FROM {src} AS src
              WHERE NOT EXISTS (SELECT 1 FROM {dest} AS dest WHERE {join})",
            dest = quote_ident(table),
            src = batch.name(),
        );
        let inserted = tx.execute(&sql, []).map_err(StoreError::from)?;

        tx.commit().map_err(StoreError::from)?;
        Ok(updated + inserted)
    }

    fn create_table(&self, manifest: &TableManifest) -> Result<()> {
        let columns = manifest
            .columns
            .iter()
            .map(|spec| {
                let nullability = if spec.nullable { "" } else { " NOT NULL" };
                format!(
                    "{} {}{nullability}",
                    quote_ident(&spec.name),
                    spec.column_type.sql_type()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("CREATE TABLE {} ({columns})", quote_ident(&manifest.table));
        self.conn.execute(&sql, []).map_err(StoreError::from)?;
        Ok(())
    }

    fn load_manifest(&self, table: &str) -> Result<Option<TableManifest>> {
        let mut stmt = self
            .conn
            .prepare("SELECT manifest FROM merge_manifest WHERE table_name = ?1")
            .map_err(StoreError::from)?;
        let mut rows = stmt.query([table]).map_err(StoreError::from)?;

        match rows.next().map_err(StoreError::from)? {
            None => Ok(None),
            Some(row) => {
                let json: String = row.get(0).map_err(StoreError::from)?;
                let manifest =
                    serde_json::from_str(&json).map_err(|e| StoreError::Manifest {
                        table: table.to_string(),
                        message: format!("stored manifest is unreadable: {e}"),
                    })?;
                Ok(Some(manifest))
            }
        }
    }

    fn save_manifest(&self, manifest: &TableManifest) -> Result<()> {
        let json = serde_json::to_string(manifest).map_err(|e| StoreError::Manifest {
            table: manifest.table.clone(),
            message: e.to_string(),
        })?;
        let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
        self.conn
            .execute(
                "INSERT INTO merge_manifest (table_name, version, manifest, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (table_name) DO UPDATE
                    SET version = excluded.version,
                        manifest = excluded.manifest,
                        updated_at = excluded.updated_at",
                rusqlite::params![manifest.table, manifest.version, json, now],
            )
            .map_err(StoreError::from)?;
        Ok(())
    }
}

/// Temp relation holding one incoming batch; dropped when the guard leaves
/// scope regardless of how the merge ended
struct TempBatch<'conn> {
    conn: &'conn Connection,
    name: String,
}

impl<'conn> TempBatch<'conn> {
    fn register(
        conn: &'conn Connection,
        table: &str,
        manifest: &TableManifest,
        effective: &[String],
        rows: &[MergeRow],
    ) -> Result<Self> {
        let name = format!("incoming_{table}");
        conn.execute(&format!("DROP TABLE IF EXISTS temp.{}", quote_ident(&name)), [])
            .map_err(StoreError::from)?;

        let columns = effective
            .iter()
            .map(|col| {
                let column_type = manifest
                    .columns
                    .iter()
                    .find(|spec| &spec.name == col)
                    .map(|spec| spec.column_type.sql_type())
                    .unwrap_or("TEXT");
                format!("{} {column_type}", quote_ident(col))
            })
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!("CREATE TEMP TABLE {} ({columns})", quote_ident(&name)),
            [],
        )
        .map_err(StoreError::from)?;

        let batch = Self { conn, name };

        let placeholders = (1..=effective.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            batch.name(),
            quoted_list(effective)
        );
        let mut stmt = conn.prepare(&sql).map_err(StoreError::from)?;
        for row in rows {
            let cells: Vec<&Value> = effective
                .iter()
                .map(|col| row.get(col).unwrap_or(&Value::Null))
                .collect();
            stmt.execute(rusqlite::params_from_iter(cells))
                .map_err(StoreError::from)?;
        }

        Ok(batch)
    }

    /// Fully qualified quoted relation name
    fn name(&self) -> String {
        format!("temp.{}", quote_ident(&self.name))
    }
}

impl Drop for TempBatch<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .conn
            .execute(&format!("DROP TABLE IF EXISTS {}", self.name()), [])
        {
            tracing::warn!(relation = %self.name, error = %e, "Could not drop temp batch");
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quoted_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_cell(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
    }
}
