//! Configuration schema types
//!
//! Defines the configuration structure that maps to `settlecheck.toml`.

use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main Settlecheck configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Serialize, Deserialize)]
pub struct SettlecheckConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// ERP source connection
    pub erp: SourceConfig,

    /// Ticketing-system source connection
    pub ticketing: TicketingConfig,

    /// Description-to-category pattern table
    #[serde(default)]
    pub categories: CategoryConfig,

    /// Run behavior (retry budget, table names)
    #[serde(default)]
    pub run: RunConfig,

    /// Snapshot export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SettlecheckConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.erp.validate("erp")?;
        self.ticketing.validate()?;
        self.categories.validate()?;
        self.run.validate()?;
        self.notify.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the local merge store
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        if self.data_dir.trim().is_empty() {
            return Err("data_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Connection settings shared by both source systems
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Connection string, held as a secret
    pub connection_string: SecretString,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Pool acquire/create timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

impl SourceConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.connection_string.expose_secret().is_empty() {
            return Err(format!("{section}.connection_string cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(format!("{section}.max_connections must be at least 1"));
        }
        Ok(())
    }
}

/// Ticketing-system configuration
///
/// The company map translates the ERP-side company code carried by each
/// ticket into the ticketing system's numeric company identifier. It is
/// pure lookup data, so it lives in configuration rather than in code.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketingConfig {
    /// Connection settings
    #[serde(flatten)]
    pub source: SourceConfig,

    /// ERP company code -> ticketing-system company id
    #[serde(default)]
    pub company_map: BTreeMap<String, i64>,
}

impl TicketingConfig {
    fn validate(&self) -> Result<(), String> {
        self.source.validate("ticketing")?;
        if self.company_map.is_empty() {
            return Err(
                "ticketing.company_map must contain at least one company translation".to_string(),
            );
        }
        Ok(())
    }
}

/// Versioned description-pattern table for detail-transaction categories
///
/// Patterns are matched as case-sensitive substrings of the normalized
/// (trimmed) ERP description. The version is recorded so a wording change in
/// the ERP descriptions becomes an explicit, reviewable config revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Pattern-table revision
    #[serde(default = "default_category_version")]
    pub version: u32,

    /// Patterns tagging a row as a cancelled ticket
    #[serde(default = "default_cancelled_patterns")]
    pub cancelled: Vec<String>,

    /// Patterns tagging a row as a returned ticket
    #[serde(default = "default_returned_patterns")]
    pub returned: Vec<String>,

    /// Patterns tagging a row as a point-of-sale entry
    #[serde(default = "default_pos_patterns")]
    pub point_of_sale: Vec<String>,

    /// Patterns tagging a row as a requisition entry
    #[serde(default = "default_requisition_patterns")]
    pub requisition: Vec<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            version: default_category_version(),
            cancelled: default_cancelled_patterns(),
            returned: default_returned_patterns(),
            point_of_sale: default_pos_patterns(),
            requisition: default_requisition_patterns(),
        }
    }
}

impl CategoryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.version == 0 {
            return Err("categories.version must be at least 1".to_string());
        }
        for (name, patterns) in [
            ("cancelled", &self.cancelled),
            ("returned", &self.returned),
            ("point_of_sale", &self.point_of_sale),
            ("requisition", &self.requisition),
        ] {
            if patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(format!("categories.{name} contains an empty pattern"));
            }
        }
        Ok(())
    }
}

/// Retry configuration for source reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (not retries) per read
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_seconds: default_retry_delay_secs(),
        }
    }
}

/// Run behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Bounded retry applied at the source-reader boundary
    #[serde(default)]
    pub retry: RetryConfig,

    /// Table receiving Valid outcomes
    #[serde(default = "default_valid_table")]
    pub valid_table: String,

    /// Table receiving Incongruent outcomes
    #[serde(default = "default_incongruent_table")]
    pub incongruent_table: String,

    /// Table receiving Errored outcomes
    #[serde(default = "default_errored_table")]
    pub errored_table: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            valid_table: default_valid_table(),
            incongruent_table: default_incongruent_table(),
            errored_table: default_errored_table(),
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<(), String> {
        if self.retry.max_attempts == 0 {
            return Err("run.retry.max_attempts must be at least 1".to_string());
        }
        for (name, table) in [
            ("valid_table", &self.valid_table),
            ("incongruent_table", &self.incongruent_table),
            ("errored_table", &self.errored_table),
        ] {
            if !is_plain_identifier(table) {
                return Err(format!(
                    "run.{name} '{table}' must be a plain identifier (letters, digits, underscore)"
                ));
            }
        }
        Ok(())
    }
}

/// Snapshot export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving CSV snapshot files
    #[serde(default = "default_export_dir")]
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_export_dir(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whether to deliver snapshot files after a run
    #[serde(default)]
    pub enabled: bool,

    /// HTTP mail-relay endpoint receiving the notification payload
    #[serde(default)]
    pub relay_endpoint: Option<String>,

    /// Recipient addresses
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Subject prefix for the notification
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl NotifyConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled {
            if self.relay_endpoint.as_deref().unwrap_or("").is_empty() {
                return Err("notify.relay_endpoint is required when notify.enabled".to_string());
            }
            if self.recipients.is_empty() {
                return Err("notify.recipients must not be empty when notify.enabled".to_string());
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory receiving log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily or hourly
    #[serde(default = "default_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if !["daily", "hourly"].contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be 'daily' or 'hourly'",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn is_plain_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !s.chars().next().unwrap_or('0').is_ascii_digit()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_max_connections() -> usize {
    4
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_category_version() -> u32 {
    1
}

fn default_cancelled_patterns() -> Vec<String> {
    vec!["BILHETE CANCELADO".to_string()]
}

fn default_returned_patterns() -> Vec<String> {
    vec!["BILHETE DEVOLVIDO".to_string()]
}

fn default_pos_patterns() -> Vec<String> {
    vec!["VENDA PDV".to_string()]
}

fn default_requisition_patterns() -> Vec<String> {
    vec!["REQUISICAO".to_string()]
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    60
}

fn default_valid_table() -> String {
    "valid_tickets".to_string()
}

fn default_incongruent_table() -> String {
    "incongruent_tickets".to_string()
}

fn default_errored_table() -> String {
    "errored_tickets".to_string()
}

fn default_export_dir() -> String {
    "data/csv".to_string()
}

fn default_subject_prefix() -> String {
    "Settlement reconciliation".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}
