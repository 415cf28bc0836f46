//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Settlecheck - settlement-ticket reconciliation
#[derive(Parser, Debug)]
#[command(name = "settlecheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "settlecheck.toml", env = "SETTLECHECK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SETTLECHECK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile one settlement date and persist the outcomes
    Run(commands::run::RunArgs),

    /// Re-export outcome snapshots without reconciling
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
