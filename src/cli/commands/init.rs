//! Init command implementation
//!
//! Generates a starter configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "settlecheck.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::starter_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set the connection strings through environment variables:");
                println!("     - SETTLECHECK_ERP_CONNECTION_STRING");
                println!("     - SETTLECHECK_TICKETING_CONNECTION_STRING");
                println!("  3. Fill [ticketing.company_map] with your company translations");
                println!("  4. Validate configuration: settlecheck validate-config");
                println!("  5. Run reconciliation: settlecheck run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(1)
            }
        }
    }

    fn starter_config() -> String {
        r#"# Settlecheck Configuration File
# Daily settlement-ticket reconciliation

[application]
log_level = "info"
data_dir = "data"

[erp]
connection_string = "${SETTLECHECK_ERP_CONNECTION_STRING}"
max_connections = 4
connection_timeout_seconds = 30

[ticketing]
connection_string = "${SETTLECHECK_TICKETING_CONNECTION_STRING}"
max_connections = 4
connection_timeout_seconds = 30

# ERP company code -> ticketing-system company id
[ticketing.company_map]
"01" = 2
"02" = 5

# Description-to-category pattern table. Bump the version when the ERP
# wording changes.
[categories]
version = 1
cancelled = ["BILHETE CANCELADO"]
returned = ["BILHETE DEVOLVIDO"]
point_of_sale = ["VENDA PDV"]
requisition = ["REQUISICAO"]

[run]
valid_table = "valid_tickets"
incongruent_table = "incongruent_tickets"
errored_table = "errored_tickets"

[run.retry]
max_attempts = 3
delay_seconds = 60

[export]
output_dir = "data/csv"

[notify]
enabled = false
# relay_endpoint = "https://relay.internal.example.com/send"
# recipients = ["finance@example.com"]
subject_prefix = "Settlement reconciliation"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_config_parses_and_validates() {
        let content = InitArgs::starter_config()
            .replace("${SETTLECHECK_ERP_CONNECTION_STRING}", "postgres://erp")
            .replace(
                "${SETTLECHECK_TICKETING_CONNECTION_STRING}",
                "postgres://ticketing",
            );
        let config: crate::config::SettlecheckConfig = toml::from_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.valid_table, "valid_tickets");
    }

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "settlecheck.toml".to_string(),
            force: false,
        };
        assert_eq!(args.output, "settlecheck.toml");
        assert!(!args.force);
    }
}
