//! External integrations: source readers for the ERP and the ticketing system.
//!
//! The engine depends only on the traits in [`traits`]; the concrete readers
//! here are thin Postgres wrappers with pooled connections and bounded retry.

pub mod erp;
pub mod retry;
pub mod ticketing;
pub mod traits;

pub use erp::PgErpReader;
pub use ticketing::PgTicketingReader;
pub use traits::{ErpReader, TicketingReader};

use crate::config::SourceConfig;
use crate::domain::{Result, SettlecheckError};
use deadpool_postgres::{Config as PoolConfig, Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::NoTls;

/// Builds a pooled Postgres connection from a source configuration
pub(crate) fn build_pool(config: &SourceConfig, system: &str) -> Result<Pool> {
    let pg_config: tokio_postgres::Config = config
        .connection_string
        .expose_secret()
        .as_ref()
        .parse()
        .map_err(|e| {
            SettlecheckError::Configuration(format!("Invalid {system} connection string: {e}"))
        })?;

    let mut pool_config = PoolConfig::new();
    pool_config.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        pool_config.manager.expect("manager config just set"),
    );

    let timeout = Duration::from_secs(config.connection_timeout_seconds);
    let pool = Pool::builder(manager)
        .max_size(config.max_connections)
        .wait_timeout(Some(timeout))
        .create_timeout(Some(timeout))
        .recycle_timeout(Some(timeout))
        .build()
        .map_err(|e| {
            SettlecheckError::Configuration(format!(
                "Failed to create {system} connection pool: {e}"
            ))
        })?;

    Ok(pool)
}
