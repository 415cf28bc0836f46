//! Reconciliation engine
//!
//! Classifies each settlement ticket against the ticketing system. Every input
//! ticket produces exactly one outcome; a ticket whose corroborating data
//! cannot be fetched lands in the errored set instead of being dropped, so the
//! three outcome sets always sum to the input count.

use crate::adapters::traits::{ErpReader, TicketingReader};
use crate::core::reconcile::money::{amounts_match, is_zero};
use crate::domain::outcome::Outcome;
use crate::domain::ticket::{
    CancelledAggregate, DetailTransaction, ExternalReceiptRecord, ExtraEvent, Ticket,
    TransactionCategory,
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

const NO_TICKETING_DATA: &str = "could not retrieve ticketing-system data";
const NO_ERP_DETAIL: &str = "could not retrieve ERP detail transactions";

/// The three outcome sets of one reconciliation run
#[derive(Debug, Default)]
pub struct RunOutcomes {
    /// Tickets the two systems agree on
    pub valid: Vec<Outcome>,

    /// Tickets with at least one reconciliation error
    pub incongruent: Vec<Outcome>,

    /// Tickets whose classification could not complete
    pub errored: Vec<Outcome>,
}

impl RunOutcomes {
    /// Total outcomes across all three sets
    pub fn total(&self) -> usize {
        self.valid.len() + self.incongruent.len() + self.errored.len()
    }

    fn push(&mut self, outcome: Outcome) {
        if outcome.is_valid() {
            self.valid.push(outcome);
        } else if outcome.is_incongruent() {
            self.incongruent.push(outcome);
        } else {
            self.errored.push(outcome);
        }
    }
}

/// Classifies settlement tickets against ticketing-system data
pub struct ReconcileEngine {
    erp: Arc<dyn ErpReader>,
    ticketing: Arc<dyn TicketingReader>,
}

impl ReconcileEngine {
    /// Creates an engine over the two source readers
    pub fn new(erp: Arc<dyn ErpReader>, ticketing: Arc<dyn TicketingReader>) -> Self {
        Self { erp, ticketing }
    }

    /// Classifies every ticket in the batch for one settlement date
    pub async fn reconcile(&self, date: NaiveDate, tickets: Vec<Ticket>) -> RunOutcomes {
        let mut outcomes = RunOutcomes::default();

        for ticket in tickets {
            let outcome = self.classify(date, &ticket).await;
            tracing::debug!(
                agency_code = %ticket.agency_code,
                ticket_number = %ticket.ticket_number,
                message = outcome.message(),
                "Classified ticket"
            );
            outcomes.push(outcome);
        }

        tracing::info!(
            date = %date,
            valid = outcomes.valid.len(),
            incongruent = outcomes.incongruent.len(),
            errored = outcomes.errored.len(),
            "Reconciliation finished"
        );
        outcomes
    }

    async fn classify(&self, date: NaiveDate, ticket: &Ticket) -> Outcome {
        let processed_at = Utc::now().naive_utc();
        let make_valid = |observation: String| {
            Outcome::valid(
                ticket.agency_name.clone(),
                ticket.agency_code.clone(),
                ticket.ticket_number.clone(),
                processed_at,
                observation,
            )
        };

        // A zeroed ticket has nothing to corroborate; skip every check.
        if is_zero(ticket.receipt) {
            return make_valid("zeroed ticket".to_string());
        }

        let Some(details) = self
            .erp
            .fetch_ticket_detail(date, &ticket.agency_code, &ticket.associated_company)
            .await
        else {
            return Outcome::errored(
                ticket.agency_name.clone(),
                ticket.agency_code.clone(),
                ticket.ticket_number.clone(),
                processed_at,
                NO_ERP_DETAIL,
            );
        };

        let mut reasons: Vec<String> = Vec::new();
        let mut observations: Vec<String> = Vec::new();
        let mut ticketing_unavailable = false;

        let receipts = self
            .ticketing
            .fetch_external_receipts(date, &ticket.agency_name, &ticket.associated_company)
            .await;
        match receipts {
            None => {
                ticketing_unavailable = true;
                reasons.push(NO_TICKETING_DATA.to_string());
            }
            Some(candidates) => {
                if !receipt_matches(ticket.receipt, &candidates) {
                    reasons.push("receipt value mismatch".to_string());
                }
            }
        }

        let aggregates = self
            .ticketing
            .fetch_cancelled_aggregates(date, &ticket.agency_name, &ticket.associated_company)
            .await;
        match aggregates {
            None => {
                if !ticketing_unavailable {
                    ticketing_unavailable = true;
                    reasons.push(NO_TICKETING_DATA.to_string());
                }
            }
            Some(candidates) => {
                check_cancelled(&details, &candidates, &mut reasons, &mut observations);
            }
        }

        let events = self
            .ticketing
            .fetch_extra_events(date, &ticket.agency_name, &ticket.associated_company)
            .await;
        match events {
            None => {
                if !ticketing_unavailable {
                    reasons.push(NO_TICKETING_DATA.to_string());
                }
            }
            Some(events) => {
                for event in &events {
                    check_extra_event(event, &details, &mut reasons);
                }
            }
        }

        check_category_presence(
            &details,
            TransactionCategory::PointOfSale,
            "ticket contains POS sales",
            &mut reasons,
            &mut observations,
        );
        check_category_presence(
            &details,
            TransactionCategory::Requisition,
            "ticket contains requisitions",
            &mut reasons,
            &mut observations,
        );

        if reasons.is_empty() {
            let observation = if observations.is_empty() {
                "nothing to report".to_string()
            } else {
                observations.join("; ")
            };
            make_valid(observation)
        } else {
            Outcome::incongruent(
                ticket.agency_name.clone(),
                ticket.agency_code.clone(),
                ticket.ticket_number.clone(),
                processed_at,
                reasons.join("; "),
            )
        }
    }
}

/// True when any candidate's derived total matches the ticket receipt
fn receipt_matches(receipt: f64, candidates: &[ExternalReceiptRecord]) -> bool {
    candidates
        .iter()
        .any(|candidate| amounts_match(receipt, candidate.receipt_total()))
}

/// Compares the ERP cancelled/returned total against the ticketing aggregates
///
/// The ERP side takes the first cancelled-category row and the first
/// returned-category row only; later rows of the same category do not
/// contribute. The candidate sum decides whether there is anything to check,
/// and any single candidate matching the ERP total counts as a match.
fn check_cancelled(
    details: &[DetailTransaction],
    candidates: &[CancelledAggregate],
    reasons: &mut Vec<String>,
    observations: &mut Vec<String>,
) {
    let first_of = |category: TransactionCategory| {
        details
            .iter()
            .find(|d| d.category == category)
            .map(|d| d.value)
            .unwrap_or(0.0)
    };
    let erp_total =
        first_of(TransactionCategory::Cancelled) + first_of(TransactionCategory::Returned);
    let candidate_sum: f64 = candidates.iter().map(|c| c.total).sum();

    if is_zero(erp_total) && is_zero(candidate_sum) {
        observations.push("no cancelled/returned tickets".to_string());
        return;
    }

    let matched = candidates
        .iter()
        .any(|candidate| amounts_match(erp_total, candidate.total));
    if !matched {
        reasons.push("cancelled/returned values mismatch".to_string());
    }
}

/// Verifies one extra event against the ERP detail rows
///
/// The corroborating row is the first detail whose description contains the
/// event description. Values compare signed: a posting of -12.00 does not
/// corroborate an event total of 12.00.
fn check_extra_event(event: &ExtraEvent, details: &[DetailTransaction], reasons: &mut Vec<String>) {
    match details
        .iter()
        .find(|d| d.description.contains(&event.description))
    {
        None => {
            reasons.push(format!("{} transaction not found in ERP", event.description));
        }
        Some(detail) => {
            if !amounts_match(event.total, detail.value) {
                reasons.push(format!("{} value mismatch", event.description));
            }
        }
    }
}

/// Flags the presence of a detail category as a reason or an observation
///
/// When errors have already accumulated the flag joins them; on an otherwise
/// clean ticket it is merely an observation.
fn check_category_presence(
    details: &[DetailTransaction],
    category: TransactionCategory,
    message: &str,
    reasons: &mut Vec<String>,
    observations: &mut Vec<String>,
) {
    if details.iter().any(|d| d.category == category) {
        if reasons.is_empty() {
            observations.push(message.to_string());
        } else {
            reasons.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(description: &str, value: f64, category: TransactionCategory) -> DetailTransaction {
        DetailTransaction {
            description: description.to_string(),
            value,
            category,
        }
    }

    #[test]
    fn test_receipt_matches_any_candidate() {
        let candidates = vec![
            ExternalReceiptRecord {
                fares: 90.0,
                ..Default::default()
            },
            ExternalReceiptRecord {
                fares: 100.0,
                boarding_tax: 5.0,
                ..Default::default()
            },
        ];
        assert!(receipt_matches(105.0, &candidates));
        assert!(!receipt_matches(104.0, &candidates));
        assert!(!receipt_matches(105.0, &[]));
    }

    #[test]
    fn test_cancelled_first_match_only() {
        let details = vec![
            detail("BILHETE CANCELADO A", 30.0, TransactionCategory::Cancelled),
            detail("BILHETE CANCELADO B", 20.0, TransactionCategory::Cancelled),
            detail("BILHETE DEVOLVIDO", 10.0, TransactionCategory::Returned),
        ];
        let candidates = vec![CancelledAggregate { total: 40.0 }];
        let mut reasons = Vec::new();
        let mut observations = Vec::new();
        // ERP total is 30 + 10; the second cancelled row does not contribute.
        check_cancelled(&details, &candidates, &mut reasons, &mut observations);
        assert!(reasons.is_empty());
        assert!(observations.is_empty());
    }

    #[test]
    fn test_cancelled_both_zero_is_observation() {
        let mut reasons = Vec::new();
        let mut observations = Vec::new();
        check_cancelled(&[], &[], &mut reasons, &mut observations);
        assert!(reasons.is_empty());
        assert_eq!(observations, vec!["no cancelled/returned tickets"]);
    }

    #[test]
    fn test_cancelled_mismatch() {
        let details = vec![detail(
            "BILHETE CANCELADO",
            25.0,
            TransactionCategory::Cancelled,
        )];
        let candidates = vec![
            CancelledAggregate { total: 10.0 },
            CancelledAggregate { total: 12.0 },
        ];
        let mut reasons = Vec::new();
        let mut observations = Vec::new();
        check_cancelled(&details, &candidates, &mut reasons, &mut observations);
        assert_eq!(reasons, vec!["cancelled/returned values mismatch"]);
    }

    #[test]
    fn test_extra_event_substring_lookup() {
        let details = vec![detail(
            "MULTA LATE FEE ABRIL",
            15.5,
            TransactionCategory::Other,
        )];
        let event = ExtraEvent {
            description: "LATE FEE".to_string(),
            nature: Some(crate::domain::ticket::EventNature::Revenue),
            total: 15.5,
        };
        let mut reasons = Vec::new();
        check_extra_event(&event, &details, &mut reasons);
        assert!(reasons.is_empty());

        let missing = ExtraEvent {
            description: "EXCESS BAGGAGE".to_string(),
            nature: None,
            total: 3.0,
        };
        check_extra_event(&missing, &details, &mut reasons);
        assert_eq!(reasons, vec!["EXCESS BAGGAGE transaction not found in ERP"]);
    }

    #[test]
    fn test_extra_event_comparison_is_signed() {
        let details = vec![detail(
            "DESPESA FRETE",
            -42.0,
            TransactionCategory::Other,
        )];
        let matching = ExtraEvent {
            description: "FRETE".to_string(),
            nature: Some(crate::domain::ticket::EventNature::Expense),
            total: -42.0,
        };
        let mut reasons = Vec::new();
        check_extra_event(&matching, &details, &mut reasons);
        assert!(reasons.is_empty());

        let sign_flipped = ExtraEvent {
            description: "FRETE".to_string(),
            nature: Some(crate::domain::ticket::EventNature::Expense),
            total: 42.0,
        };
        check_extra_event(&sign_flipped, &details, &mut reasons);
        assert_eq!(reasons, vec!["FRETE value mismatch"]);
    }

    #[test]
    fn test_category_presence_reason_or_observation() {
        let details = vec![detail("VENDA PDV", 5.0, TransactionCategory::PointOfSale)];
        let mut reasons = Vec::new();
        let mut observations = Vec::new();
        check_category_presence(
            &details,
            TransactionCategory::PointOfSale,
            "ticket contains POS sales",
            &mut reasons,
            &mut observations,
        );
        assert_eq!(observations, vec!["ticket contains POS sales"]);

        let mut reasons = vec!["receipt value mismatch".to_string()];
        let mut observations = Vec::new();
        check_category_presence(
            &details,
            TransactionCategory::PointOfSale,
            "ticket contains POS sales",
            &mut reasons,
            &mut observations,
        );
        assert_eq!(
            reasons,
            vec!["receipt value mismatch", "ticket contains POS sales"]
        );
        assert!(observations.is_empty());
    }
}
