//! Source-reader abstraction traits
//!
//! These traits are the seam between the reconciliation engine and the two
//! remote systems. The engine only ever sees these interfaces; the concrete
//! readers own connection handling, retry, and row decoding.
//!
//! Contract: operations other than the ticket summary never raise past this
//! boundary. Connectivity failures are retried a bounded number of times and
//! then surface as `None` ("no data"); only `fetch_ticket_summary` returns an
//! error, because a run with no summary has nothing to reconcile.

use crate::domain::ids::{AgencyCode, CompanyCode};
use crate::domain::ticket::{
    CancelledAggregate, DetailTransaction, ExternalReceiptRecord, ExtraEvent, Ticket,
};
use crate::domain::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Read-only access to the ERP (accounting system of record)
#[async_trait]
pub trait ErpReader: Send + Sync {
    /// Fetch all settlement tickets issued on `date`
    ///
    /// An empty vector means there is nothing to reconcile (not an error).
    ///
    /// # Errors
    ///
    /// Returns an error on unrecoverable connection failure after retries;
    /// this aborts the whole run.
    async fn fetch_ticket_summary(&self, date: NaiveDate) -> Result<Vec<Ticket>>;

    /// Fetch the per-agency detail transactions for `date`
    ///
    /// Detail rows come back with their category already resolved.
    /// Returns `None` on lookup failure or missing parameters (logged, never
    /// raised).
    async fn fetch_ticket_detail(
        &self,
        date: NaiveDate,
        agency_code: &AgencyCode,
        associated_company: &CompanyCode,
    ) -> Option<Vec<DetailTransaction>>;
}

/// Read-only access to the ticketing system
#[async_trait]
pub trait TicketingReader: Send + Sync {
    /// Fetch all candidate receipt aggregates for an agency on `date`
    ///
    /// Returns `None` on lookup failure; `Some(vec![])` when the query
    /// succeeded but found no candidates. The engine treats these
    /// differently, so the distinction matters.
    async fn fetch_external_receipts(
        &self,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<ExternalReceiptRecord>>;

    /// Fetch the extra revenue/expense events for an agency on `date`
    async fn fetch_extra_events(
        &self,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<ExtraEvent>>;

    /// Fetch the cancelled/returned aggregates for an agency on `date`
    ///
    /// Already-cancelled amounts are excluded from receipt totals, so these
    /// rows are disjoint from [`fetch_external_receipts`] output.
    ///
    /// [`fetch_external_receipts`]: TicketingReader::fetch_external_receipts
    async fn fetch_cancelled_aggregates(
        &self,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<CancelledAggregate>>;
}
