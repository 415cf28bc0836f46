//! End-of-run summary

use chrono::NaiveDate;
use std::time::Duration;

/// Counts and timing for one completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub tickets: usize,
    pub valid: usize,
    pub incongruent: usize,
    pub errored: usize,
    pub exported_files: usize,
    pub duration: Duration,
}

impl RunSummary {
    /// Logs the summary at info level
    pub fn log(&self) {
        tracing::info!(
            date = %self.date,
            tickets = self.tickets,
            valid = self.valid,
            incongruent = self.incongruent,
            errored = self.errored,
            exported_files = self.exported_files,
            duration_ms = self.duration.as_millis() as u64,
            "Run completed"
        );
    }
}
