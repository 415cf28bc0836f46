//! CLI command implementations

pub mod export;
pub mod init;
pub mod run;
pub mod validate;

use chrono::{Days, Local, NaiveDate};

/// Resolves the settlement date argument, defaulting to yesterday
///
/// # Errors
///
/// Returns a message when the argument is not a YYYY-MM-DD date.
pub(crate) fn resolve_date(arg: Option<&str>) -> Result<NaiveDate, String> {
    match arg {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date '{raw}'. Expected YYYY-MM-DD")),
        None => {
            let today = Local::now().date_naive();
            Ok(today.checked_sub_days(Days::new(1)).unwrap_or(today))
        }
    }
}
