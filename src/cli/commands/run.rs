//! Run command implementation
//!
//! Executes one reconciliation run for a settlement date.

use crate::cli::commands::resolve_date;
use crate::config::load_config;
use crate::core::run::RunCoordinator;
use clap::Args;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Settlement date to reconcile (YYYY-MM-DD, default: yesterday)
    #[arg(short, long)]
    pub date: Option<String>,
}

impl RunArgs {
    /// Execute the run command
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
                tracing::error!(error = %e, "Could not load configuration");
                eprintln!("❌ Configuration error: {e}");
                return Ok(2);
            }
        };

        let mut coordinator = match RunCoordinator::from_config(&config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Could not set up run components");
                eprintln!("❌ Setup failed: {e}");
                return Ok(1);
            }
        };

        match coordinator.execute(date).await {
            Ok(summary) => {
                println!("✅ Reconciliation completed for {date}");
                println!("   Tickets:     {}", summary.tickets);
                println!("   Valid:       {}", summary.valid);
                println!("   Incongruent: {}", summary.incongruent);
                println!("   Errored:     {}", summary.errored);
                println!("   Snapshots:   {}", summary.exported_files);
                Ok(0)
            }
            Err(e) => {
                tracing::error!(date = %date, error = %e, "Run failed");
                eprintln!("❌ Run failed: {e}");
                Ok(1)
            }
        }
    }
}
