//! Domain models and types for Settlecheck.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`AgencyCode`], [`CompanyCode`], [`TicketNumber`])
//! - **Source-record models** ([`Ticket`], [`ExternalReceiptRecord`],
//!   [`DetailTransaction`], [`CancelledAggregate`], [`ExtraEvent`])
//! - **Outcome types** ([`Outcome`], [`Classification`])
//! - **Error types** ([`SettlecheckError`], [`SourceError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! Identifiers use the newtype pattern so the ERP agency code can never be
//! handed to an operation expecting the ticketing system's identifier:
//!
//! ```rust
//! use settlecheck::domain::{AgencyCode, CompanyCode};
//!
//! # fn example() -> Result<(), String> {
//! let agency = AgencyCode::new("000153")?;
//! let company = CompanyCode::new("01")?;
//! // let wrong: AgencyCode = company;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod outcome;
pub mod result;
pub mod ticket;

// Re-export commonly used types for convenience
pub use errors::{SettlecheckError, SourceError, StoreError};
pub use ids::{AgencyCode, CompanyCode, TicketNumber};
pub use outcome::{Classification, Outcome};
pub use result::Result;
pub use ticket::{
    CancelledAggregate, DetailTransaction, EventNature, ExternalReceiptRecord, ExtraEvent, Ticket,
    TransactionCategory,
};
