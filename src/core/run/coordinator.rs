//! Daily run coordination
//!
//! Wires the source readers, the reconciliation engine, the merge store, the
//! exporter, and the notifier into one sequential run. Only an unavailable
//! ticket summary or a store failure aborts a run; export and notification
//! problems are logged and the run still counts as successful.

use crate::adapters::erp::PgErpReader;
use crate::adapters::ticketing::PgTicketingReader;
use crate::adapters::traits::{ErpReader, TicketingReader};
use crate::config::{RunConfig, SettlecheckConfig};
use crate::core::export::SnapshotExporter;
use crate::core::merge::{MergeOptions, MergeRow, MergeStore};
use crate::core::reconcile::{CategoryMatcher, ReconcileEngine, RunOutcomes};
use crate::core::run::summary::RunSummary;
use crate::domain::outcome::{Classification, Outcome};
use crate::domain::Result;
use crate::notify::RelayMailer;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Database file name inside the configured data directory
const STORE_FILE: &str = "settlecheck.db";

/// Coordinates one reconciliation run end to end
pub struct RunCoordinator {
    erp: Arc<dyn ErpReader>,
    ticketing: Arc<dyn TicketingReader>,
    store: MergeStore,
    exporter: SnapshotExporter,
    mailer: Option<RelayMailer>,
    run: RunConfig,
}

impl RunCoordinator {
    /// Builds a coordinator with concrete Postgres readers from configuration
    ///
    /// # Errors
    ///
    /// Returns an error when a connection pool or the local store cannot be
    /// set up.
    pub fn from_config(config: &SettlecheckConfig) -> Result<Self> {
        let categories = CategoryMatcher::from_config(&config.categories);
        let erp = PgErpReader::new(&config.erp, config.run.retry.clone(), categories)?;
        let ticketing = PgTicketingReader::new(&config.ticketing, config.run.retry.clone())?;

        let data_dir = Path::new(&config.application.data_dir);
        std::fs::create_dir_all(data_dir)?;
        let store = MergeStore::open(data_dir.join(STORE_FILE))?;

        let mailer = if config.notify.enabled {
            Some(RelayMailer::new(config.notify.clone())?)
        } else {
            None
        };

        Ok(Self {
            erp: Arc::new(erp),
            ticketing: Arc::new(ticketing),
            store,
            exporter: SnapshotExporter::new(config.export.output_dir.clone()),
            mailer,
            run: config.run.clone(),
        })
    }

    /// Builds a coordinator from pre-built components
    pub fn with_components(
        erp: Arc<dyn ErpReader>,
        ticketing: Arc<dyn TicketingReader>,
        store: MergeStore,
        exporter: SnapshotExporter,
        mailer: Option<RelayMailer>,
        run: RunConfig,
    ) -> Self {
        Self {
            erp,
            ticketing,
            store,
            exporter,
            mailer,
            run,
        }
    }

    /// Runs reconciliation for one settlement date
    ///
    /// # Errors
    ///
    /// Returns an error when the ticket summary cannot be fetched or an
    /// outcome batch cannot be merged; classification itself never fails the
    /// run.
    pub async fn execute(&mut self, date: NaiveDate) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!(date = %date, "Starting reconciliation run");

        let tickets = self.erp.fetch_ticket_summary(date).await?;
        let ticket_count = tickets.len();

        let engine = ReconcileEngine::new(Arc::clone(&self.erp), Arc::clone(&self.ticketing));
        let outcomes = engine.reconcile(date, tickets).await;

        self.persist(date, &outcomes)?;
        let files = self.export_snapshots(date);

        if let Some(mailer) = &self.mailer {
            mailer.send(date, &files).await;
        }

        let summary = RunSummary {
            date,
            tickets: ticket_count,
            valid: outcomes.valid.len(),
            incongruent: outcomes.incongruent.len(),
            errored: outcomes.errored.len(),
            exported_files: files.len(),
            duration: started.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    /// Re-exports the current snapshots without reconciling
    ///
    /// # Errors
    ///
    /// Returns an error when no snapshot could be written at all.
    pub fn export(&self, date: NaiveDate) -> Result<Vec<PathBuf>> {
        let files = self.export_snapshots(date);
        if files.is_empty() {
            return Err(crate::domain::SettlecheckError::Export(
                "no snapshot could be written".to_string(),
            ));
        }
        Ok(files)
    }

    fn persist(&mut self, date: NaiveDate, outcomes: &RunOutcomes) -> Result<()> {
        let options = MergeOptions {
            match_columns: vec![
                "agency_code".to_string(),
                "ticket_number".to_string(),
                "settlement_date".to_string(),
            ],
            exclude_columns: Vec::new(),
            evolve_schema: true,
        };

        for (table, rows, column) in [
            (&self.run.valid_table, &outcomes.valid, "observation"),
            (&self.run.incongruent_table, &outcomes.incongruent, "reason"),
            (&self.run.errored_table, &outcomes.errored, "diagnostic"),
        ] {
            let batch = rows
                .iter()
                .map(|outcome| outcome_row(date, outcome, column))
                .collect();
            self.store.upsert(table, batch, &options)?;
        }
        Ok(())
    }

    fn export_snapshots(&self, date: NaiveDate) -> Vec<PathBuf> {
        [&self.run.valid_table, &self.run.incongruent_table]
            .into_iter()
            .filter_map(|table| self.exporter.export_table(&self.store, table, date))
            .collect()
    }
}

fn outcome_row(date: NaiveDate, outcome: &Outcome, message_column: &str) -> MergeRow {
    debug_assert!(matches!(
        (&outcome.classification, message_column),
        (Classification::Valid { .. }, "observation")
            | (Classification::Incongruent { .. }, "reason")
            | (Classification::Errored { .. }, "diagnostic")
    ));

    MergeRow::new()
        .set("settlement_date", date.format("%Y-%m-%d").to_string())
        .set("agency_name", outcome.agency_name.clone())
        .set("agency_code", outcome.agency_code.to_string())
        .set("ticket_number", outcome.ticket_number.to_string())
        .set(message_column, outcome.message())
        .set(crate::core::merge::PROCESSED_AT, outcome.processed_at)
}
