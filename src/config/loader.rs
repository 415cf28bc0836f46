//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SettlecheckConfig;
use crate::domain::errors::SettlecheckError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SettlecheckConfig`]
/// 4. Applies environment variable overrides (`SETTLECHECK_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is unset, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<SettlecheckConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SettlecheckError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SettlecheckError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: SettlecheckConfig = toml::from_str(&contents)
        .map_err(|e| SettlecheckError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SettlecheckError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched so documentation examples in the config
/// file don't trigger missing-variable errors.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SettlecheckError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `SETTLECHECK_*` prefix
///
/// Variables follow the pattern `SETTLECHECK_<SECTION>_<KEY>`, e.g.
/// `SETTLECHECK_APPLICATION_LOG_LEVEL` or `SETTLECHECK_EXPORT_OUTPUT_DIR`.
fn apply_env_overrides(config: &mut SettlecheckConfig) {
    use crate::config::secret::secret_string;

    if let Ok(val) = std::env::var("SETTLECHECK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("SETTLECHECK_APPLICATION_DATA_DIR") {
        config.application.data_dir = val;
    }

    if let Ok(val) = std::env::var("SETTLECHECK_ERP_CONNECTION_STRING") {
        config.erp.connection_string = secret_string(val);
    }
    if let Ok(val) = std::env::var("SETTLECHECK_TICKETING_CONNECTION_STRING") {
        config.ticketing.source.connection_string = secret_string(val);
    }

    if let Ok(val) = std::env::var("SETTLECHECK_RUN_RETRY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.run.retry.max_attempts = attempts;
        }
    }
    if let Ok(val) = std::env::var("SETTLECHECK_RUN_RETRY_DELAY_SECONDS") {
        if let Ok(delay) = val.parse() {
            config.run.retry.delay_seconds = delay;
        }
    }

    if let Ok(val) = std::env::var("SETTLECHECK_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }

    if let Ok(val) = std::env::var("SETTLECHECK_NOTIFY_ENABLED") {
        config.notify.enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SETTLECHECK_NOTIFY_RELAY_ENDPOINT") {
        config.notify.relay_endpoint = Some(val);
    }

    if let Ok(val) = std::env::var("SETTLECHECK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SETTLECHECK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
