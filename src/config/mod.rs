//! Configuration management for Settlecheck.
//!
//! TOML-based configuration loading, parsing, and validation with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SETTLECHECK_*` environment overrides
//! - Default values for optional settings
//! - Per-section validation
//!
//! # Example configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! data_dir = "data"
//!
//! [erp]
//! connection_string = "${SETTLECHECK_ERP_CONNECTION_STRING}"
//!
//! [ticketing]
//! connection_string = "${SETTLECHECK_TICKETING_CONNECTION_STRING}"
//!
//! [ticketing.company_map]
//! "01" = 2
//! "02" = 22
//!
//! [notify]
//! enabled = false
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CategoryConfig, ExportConfig, LoggingConfig, NotifyConfig, RetryConfig,
    RunConfig, SettlecheckConfig, SourceConfig, TicketingConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
