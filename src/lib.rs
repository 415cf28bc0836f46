// Settlecheck - Settlement-Ticket Reconciliation
// Copyright (c) 2025 Settlecheck Contributors
// Licensed under the MIT License

//! # Settlecheck - Settlement-Ticket Reconciliation
//!
//! Settlecheck reconciles the daily per-agency settlement tickets issued by an
//! accounting ERP against the transaction reports of a ticketing system, and
//! persists a classified outcome for every ticket.
//!
//! ## Overview
//!
//! Each nightly run:
//! - **Fetches** the settlement tickets for one date from the ERP
//! - **Classifies** every ticket as valid, incongruent, or errored by checking
//!   receipts, cancelled/returned totals, and extra revenue/expense events
//!   against the ticketing system
//! - **Merges** the outcomes idempotently into a local SQLite store, newest
//!   classification winning
//! - **Exports** per-outcome CSV snapshots and optionally mails them out
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (reconcile, merge, export, run coordination)
//! - [`adapters`] - Source-system readers (ERP, ticketing)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`notify`] - Run notification delivery
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use settlecheck::config::load_config;
//! use settlecheck::core::run::RunCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("settlecheck.toml")?;
//!     let mut coordinator = RunCoordinator::from_config(&config)?;
//!
//!     let date = chrono::NaiveDate::from_ymd_opt(2025, 4, 16).unwrap();
//!     let summary = coordinator.execute(date).await?;
//!
//!     println!("Classified {} tickets", summary.tickets);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod notify;
