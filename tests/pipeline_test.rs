//! Full-run pipeline test with mock readers, a file-backed store, and a
//! temp-dir export directory

use async_trait::async_trait;
use chrono::NaiveDate;
use settlecheck::adapters::traits::{ErpReader, TicketingReader};
use settlecheck::config::RunConfig;
use settlecheck::core::export::SnapshotExporter;
use settlecheck::core::merge::MergeStore;
use settlecheck::core::run::RunCoordinator;
use settlecheck::domain::ids::{AgencyCode, CompanyCode, TicketNumber};
use settlecheck::domain::ticket::{
    CancelledAggregate, DetailTransaction, ExternalReceiptRecord, ExtraEvent, Ticket,
};
use settlecheck::domain::{Result, SettlecheckError};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

struct ScriptedErp {
    summary: Option<Vec<Ticket>>,
}

#[async_trait]
impl ErpReader for ScriptedErp {
    async fn fetch_ticket_summary(&self, _date: NaiveDate) -> Result<Vec<Ticket>> {
        self.summary
            .clone()
            .ok_or_else(|| SettlecheckError::Other("summary unavailable".to_string()))
    }

    async fn fetch_ticket_detail(
        &self,
        _date: NaiveDate,
        _agency_code: &AgencyCode,
        _associated_company: &CompanyCode,
    ) -> Option<Vec<DetailTransaction>> {
        Some(Vec::new())
    }
}

struct ScriptedTicketing {
    receipt_total_by_agency: Vec<(String, f64)>,
}

#[async_trait]
impl TicketingReader for ScriptedTicketing {
    async fn fetch_external_receipts(
        &self,
        _date: NaiveDate,
        agency_name: &str,
        _associated_company: &CompanyCode,
    ) -> Option<Vec<ExternalReceiptRecord>> {
        let total = self
            .receipt_total_by_agency
            .iter()
            .find(|(name, _)| name == agency_name)
            .map(|(_, total)| *total)?;
        Some(vec![ExternalReceiptRecord {
            fares: total,
            ..Default::default()
        }])
    }

    async fn fetch_extra_events(
        &self,
        _date: NaiveDate,
        _agency_name: &str,
        _associated_company: &CompanyCode,
    ) -> Option<Vec<ExtraEvent>> {
        Some(Vec::new())
    }

    async fn fetch_cancelled_aggregates(
        &self,
        _date: NaiveDate,
        _agency_name: &str,
        _associated_company: &CompanyCode,
    ) -> Option<Vec<CancelledAggregate>> {
        Some(Vec::new())
    }
}

fn ticket(agency_name: &str, agency_code: &str, receipt: f64) -> Ticket {
    Ticket {
        agency_name: agency_name.to_string(),
        agency_code: AgencyCode::from_str(agency_code).unwrap(),
        associated_company: CompanyCode::from_str("01").unwrap(),
        ticket_number: TicketNumber::from_str("20250416").unwrap(),
        receipt,
        expense: 0.0,
        net: receipt,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 16).unwrap()
}

fn coordinator(dir: &TempDir, erp: ScriptedErp, ticketing: ScriptedTicketing) -> RunCoordinator {
    let store = MergeStore::open(dir.path().join("settlecheck.db")).unwrap();
    let exporter = SnapshotExporter::new(dir.path().join("csv"));
    RunCoordinator::with_components(
        Arc::new(erp),
        Arc::new(ticketing),
        store,
        exporter,
        None,
        RunConfig::default(),
    )
}

#[tokio::test]
async fn run_classifies_persists_and_exports() {
    let dir = TempDir::new().unwrap();
    let erp = ScriptedErp {
        summary: Some(vec![
            ticket("CURITIBA", "000153", 105.0),
            ticket("LONDRINA", "000154", 80.0),
            ticket("MARINGA", "000155", 0.0),
        ]),
    };
    let ticketing = ScriptedTicketing {
        // LONDRINA's candidate disagrees; MARINGA is zeroed and never looked up.
        receipt_total_by_agency: vec![
            ("CURITIBA".to_string(), 105.0),
            ("LONDRINA".to_string(), 79.0),
        ],
    };

    let mut coordinator = coordinator(&dir, erp, ticketing);
    let summary = coordinator.execute(date()).await.unwrap();

    assert_eq!(summary.tickets, 3);
    assert_eq!(summary.valid, 2);
    assert_eq!(summary.incongruent, 1);
    assert_eq!(summary.errored, 0);
    assert_eq!(summary.exported_files, 2);

    let valid_csv = dir.path().join("csv/valid_tickets_20250416.csv");
    let incongruent_csv = dir.path().join("csv/incongruent_tickets_20250416.csv");
    assert!(valid_csv.exists());
    assert!(incongruent_csv.exists());

    let contents = std::fs::read_to_string(&incongruent_csv).unwrap();
    assert!(contents.contains("000154"));
    assert!(contents.contains("receipt value mismatch"));
    // Semicolons never survive into the CSV cells.
    assert!(!contents.contains(';'));
}

#[tokio::test]
async fn rerunning_the_same_date_does_not_duplicate_rows() {
    let dir = TempDir::new().unwrap();
    let summary_tickets = vec![ticket("CURITIBA", "000153", 105.0)];
    let ticketing_data = vec![("CURITIBA".to_string(), 105.0)];

    let erp = ScriptedErp {
        summary: Some(summary_tickets.clone()),
    };
    let ticketing = ScriptedTicketing {
        receipt_total_by_agency: ticketing_data.clone(),
    };
    let mut first = coordinator(&dir, erp, ticketing);
    first.execute(date()).await.unwrap();
    drop(first);

    let erp = ScriptedErp {
        summary: Some(summary_tickets),
    };
    let ticketing = ScriptedTicketing {
        receipt_total_by_agency: ticketing_data,
    };
    let mut second = coordinator(&dir, erp, ticketing);
    second.execute(date()).await.unwrap();
    drop(second);

    let store = MergeStore::open(dir.path().join("settlecheck.db")).unwrap();
    let snapshot = store.snapshot("valid_tickets").unwrap();
    assert_eq!(snapshot.rows.len(), 1);
}

#[tokio::test]
async fn unavailable_summary_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let erp = ScriptedErp { summary: None };
    let ticketing = ScriptedTicketing {
        receipt_total_by_agency: Vec::new(),
    };

    let mut coordinator = coordinator(&dir, erp, ticketing);
    let err = coordinator.execute(date()).await.unwrap_err();
    assert!(err.to_string().contains("summary unavailable"));
}
