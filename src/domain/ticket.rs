//! Source-record models
//!
//! Everything in this module is ephemeral: fetched fresh from the two source
//! systems on every run and discarded once classification is done. Only the
//! resulting outcomes are persisted.

use crate::domain::ids::{AgencyCode, CompanyCode, TicketNumber};
use serde::{Deserialize, Serialize};

/// A daily settlement ticket as issued by the ERP nightly close
///
/// Identity is (agency_code, associated_company, ticket_number). Read-only to
/// this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Human-readable agency name (also the ticketing-system lookup key)
    pub agency_name: String,

    /// ERP-local agency code
    pub agency_code: AgencyCode,

    /// ERP-side company code the agency settles under
    pub associated_company: CompanyCode,

    /// Ticket number in settlement-date format (YYYYMMDD)
    pub ticket_number: TicketNumber,

    /// Total receipt amount reported by the ERP
    pub receipt: f64,

    /// Total expense amount reported by the ERP
    pub expense: f64,

    /// Net amount (receipt - expense)
    pub net: f64,
}

/// One candidate receipt aggregate from the ticketing system
///
/// Multiple candidates may exist per agency/date (e.g. one per associated
/// company); a ticket's receipt matches if *any* candidate's derived total
/// matches. Sub-totals may be absent on the wire and default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalReceiptRecord {
    /// Fare sub-total
    pub fares: f64,

    /// Boarding tax sub-total
    pub boarding_tax: f64,

    /// Toll tax sub-total
    pub toll_tax: f64,

    /// Other fees sub-total
    pub other_fees: f64,

    /// Insurance sub-total
    pub insurance: f64,
}

impl ExternalReceiptRecord {
    /// Derived receipt total: the sum of all sub-totals
    pub fn receipt_total(&self) -> f64 {
        self.fares + self.boarding_tax + self.toll_tax + self.other_fees + self.insurance
    }
}

/// Category tag for an ERP detail transaction
///
/// Resolved once at ingestion from the free-text description by the
/// category matcher, instead of probing descriptions at comparison time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    /// Cancelled-ticket transaction
    Cancelled,
    /// Returned-ticket transaction
    Returned,
    /// Point-of-sale transaction
    PointOfSale,
    /// Requisition transaction
    Requisition,
    /// Anything the pattern table does not recognize
    Other,
}

/// A per-agency ERP detail transaction (extra revenue/expense postings)
///
/// Detail rows do not list the agency's transacted tickets; they carry the
/// corroborating entries the reconciliation checks run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailTransaction {
    /// Free-text transaction description as stored in the ERP
    pub description: String,

    /// Signed transaction value
    pub value: f64,

    /// Category resolved at ingestion
    pub category: TransactionCategory,
}

/// Per-agency aggregate of cancelled/returned value from the ticketing system
///
/// Disjoint from [`ExternalReceiptRecord`]: already-cancelled amounts are
/// excluded from receipt totals. Like receipts, more than one candidate row
/// may come back per agency/date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelledAggregate {
    /// Total cancelled/returned value for this candidate
    pub total: f64,
}

/// Nature of an extra event (absent for some rows on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventNature {
    /// Extra revenue (e.g. fine, excess baggage)
    Revenue,
    /// Extra expense
    Expense,
}

/// An extra revenue/expense event from the ticketing system
///
/// One row per distinct description per agency/date, already summed when the
/// same description occurs more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraEvent {
    /// Event description (e.g. "LATE FEE")
    pub description: String,

    /// Revenue or expense; may be absent on the wire
    pub nature: Option<EventNature>,

    /// Total value for this description
    pub total: f64,
}
