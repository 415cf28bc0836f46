//! Export command implementation
//!
//! Re-exports the current outcome snapshots without reconciling. Useful when
//! a CSV was deleted or needs to be re-sent by hand.

use crate::cli::commands::resolve_date;
use crate::config::load_config;
use crate::core::export::SnapshotExporter;
use crate::core::merge::MergeStore;
use clap::Args;
use std::path::Path;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Date stamp for the snapshot file names (YYYY-MM-DD, default: yesterday)
    #[arg(short, long)]
    pub date: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let date = match resolve_date(self.date.as_deref()) {
            Ok(date) => date,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Configuration error: {e}");
                return Ok(2);
            }
        };

        let store_path = Path::new(&config.application.data_dir).join("settlecheck.db");
        let store = match MergeStore::open(&store_path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("❌ Could not open store {}: {e}", store_path.display());
                return Ok(1);
            }
        };

        let exporter = SnapshotExporter::new(config.export.output_dir.clone());
        let mut written = 0;
        for table in [&config.run.valid_table, &config.run.incongruent_table] {
            if let Some(path) = exporter.export_table(&store, table, date) {
                println!("✅ Wrote {}", path.display());
                written += 1;
            } else {
                eprintln!("❌ Could not export table '{table}'");
            }
        }

        Ok(if written > 0 { 0 } else { 1 })
    }
}
