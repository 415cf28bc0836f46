//! Reconciliation outcome types
//!
//! Every input ticket maps to exactly one outcome per run. The three classes
//! are mutually exclusive and exhaustive: a ticket that blows up mid-check
//! lands in `Errored` rather than vanishing from the batch, so run totals
//! always reconcile against the input count.

use crate::domain::ids::{AgencyCode, TicketNumber};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Classification of a single ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// The two systems agree
    Valid {
        /// Free-text observation ("nothing to report" when there is none)
        observation: String,
    },
    /// The two systems disagree
    Incongruent {
        /// Non-empty, "; "-joined reason list
        reason: String,
    },
    /// Classification could not complete for this ticket
    Errored {
        /// Diagnostic describing what failed
        diagnostic: String,
    },
}

/// Per-ticket reconciliation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Agency name as reported by the ERP
    pub agency_name: String,

    /// ERP-local agency code
    pub agency_code: AgencyCode,

    /// Settlement ticket number
    pub ticket_number: TicketNumber,

    /// When this outcome was produced
    pub processed_at: NaiveDateTime,

    /// The classification itself
    pub classification: Classification,
}

impl Outcome {
    /// Builds a Valid outcome
    pub fn valid(
        agency_name: impl Into<String>,
        agency_code: AgencyCode,
        ticket_number: TicketNumber,
        processed_at: NaiveDateTime,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            agency_name: agency_name.into(),
            agency_code,
            ticket_number,
            processed_at,
            classification: Classification::Valid {
                observation: observation.into(),
            },
        }
    }

    /// Builds an Incongruent outcome
    pub fn incongruent(
        agency_name: impl Into<String>,
        agency_code: AgencyCode,
        ticket_number: TicketNumber,
        processed_at: NaiveDateTime,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            agency_name: agency_name.into(),
            agency_code,
            ticket_number,
            processed_at,
            classification: Classification::Incongruent {
                reason: reason.into(),
            },
        }
    }

    /// Builds an Errored outcome
    pub fn errored(
        agency_name: impl Into<String>,
        agency_code: AgencyCode,
        ticket_number: TicketNumber,
        processed_at: NaiveDateTime,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self {
            agency_name: agency_name.into(),
            agency_code,
            ticket_number,
            processed_at,
            classification: Classification::Errored {
                diagnostic: diagnostic.into(),
            },
        }
    }

    /// True when the outcome is Valid
    pub fn is_valid(&self) -> bool {
        matches!(self.classification, Classification::Valid { .. })
    }

    /// True when the outcome is Incongruent
    pub fn is_incongruent(&self) -> bool {
        matches!(self.classification, Classification::Incongruent { .. })
    }

    /// True when the outcome is Errored
    pub fn is_errored(&self) -> bool {
        matches!(self.classification, Classification::Errored { .. })
    }

    /// The observation, reason, or diagnostic text, regardless of class
    pub fn message(&self) -> &str {
        match &self.classification {
            Classification::Valid { observation } => observation,
            Classification::Incongruent { reason } => reason,
            Classification::Errored { diagnostic } => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_outcome(classification: Classification) -> Outcome {
        Outcome {
            agency_name: "CURITIBA".to_string(),
            agency_code: AgencyCode::from_str("000153").unwrap(),
            ticket_number: TicketNumber::from_str("20250416").unwrap(),
            processed_at: chrono::NaiveDate::from_ymd_opt(2025, 4, 17)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap(),
            classification,
        }
    }

    #[test]
    fn test_classification_predicates() {
        let valid = sample_outcome(Classification::Valid {
            observation: "nothing to report".to_string(),
        });
        assert!(valid.is_valid());
        assert!(!valid.is_incongruent());
        assert!(!valid.is_errored());

        let incongruent = sample_outcome(Classification::Incongruent {
            reason: "receipt value mismatch".to_string(),
        });
        assert!(incongruent.is_incongruent());

        let errored = sample_outcome(Classification::Errored {
            diagnostic: "reader failure".to_string(),
        });
        assert!(errored.is_errored());
    }

    #[test]
    fn test_message_accessor() {
        let outcome = sample_outcome(Classification::Incongruent {
            reason: "receipt value mismatch; cancelled/returned values mismatch".to_string(),
        });
        assert!(outcome.message().starts_with("receipt value mismatch"));
    }
}
