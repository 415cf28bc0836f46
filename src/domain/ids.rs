//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that make up a ticket's identity.
//! Each type ensures the two systems' codes cannot be mixed up at compile time:
//! the ERP agency code is *not* the ticketing system's agency identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ERP-local agency code newtype wrapper
///
/// Identifies an agency inside the ERP. This code is distinct from the
/// ticketing system's agency identifier; the ticketing side is addressed by
/// agency *name* plus a translated company code.
///
/// # Examples
///
/// ```
/// use settlecheck::domain::ids::AgencyCode;
/// use std::str::FromStr;
///
/// let code = AgencyCode::from_str("000153").unwrap();
/// assert_eq!(code.as_str(), "000153");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyCode(String);

impl AgencyCode {
    /// Creates a new AgencyCode, trimming surrounding whitespace
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err("Agency code cannot be empty".to_string());
        }
        Ok(Self(code))
    }

    /// Returns the agency code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AgencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Associated company code newtype wrapper
///
/// The ERP-side company identifier attached to a ticket (e.g. "01", "02").
/// Translation to the ticketing system's numeric company id happens in the
/// ticketing reader via the configured company map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyCode(String);

impl CompanyCode {
    /// Creates a new CompanyCode, trimming surrounding whitespace
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err("Company code cannot be empty".to_string());
        }
        Ok(Self(code))
    }

    /// Returns the company code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CompanyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Settlement ticket number newtype wrapper
///
/// Ticket numbers follow the settlement-date format `YYYYMMDD` as issued by
/// the ERP nightly close.
///
/// # Examples
///
/// ```
/// use settlecheck::domain::ids::TicketNumber;
/// use std::str::FromStr;
///
/// let num = TicketNumber::from_str("20250416").unwrap();
/// assert_eq!(num.as_str(), "20250416");
/// assert!(TicketNumber::from_str("2025-04").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketNumber(String);

impl TicketNumber {
    /// Creates a new TicketNumber
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is exactly eight ASCII digits.
    pub fn new(number: impl Into<String>) -> Result<Self, String> {
        let number = number.into().trim().to_string();
        if number.len() != 8 || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!(
                "Invalid ticket number '{number}'. Expected settlement-date format YYYYMMDD"
            ));
        }
        Ok(Self(number))
    }

    /// Returns the ticket number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TicketNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
