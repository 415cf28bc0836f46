//! Postgres-backed ticketing-system reader

use super::queries;
use crate::adapters::retry::with_retry;
use crate::adapters::traits::TicketingReader;
use crate::config::{RetryConfig, TicketingConfig};
use crate::domain::ids::CompanyCode;
use crate::domain::ticket::{CancelledAggregate, EventNature, ExternalReceiptRecord, ExtraEvent};
use crate::domain::{Result, SourceError};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use deadpool_postgres::Pool;
use std::collections::BTreeMap;
use tokio_postgres::Row;

const SYSTEM: &str = "ticketing";

/// Reader for the ticketing-system reporting tables
///
/// The ERP-side company code on each ticket is translated to the ticketing
/// system's numeric company id through the configured company map before any
/// query runs. An unmapped company is a missing-parameter condition: the call
/// logs an error and reports "no data" rather than querying with a bogus id.
pub struct PgTicketingReader {
    pool: Pool,
    retry: RetryConfig,
    company_map: BTreeMap<String, i64>,
}

impl PgTicketingReader {
    /// Creates a new ticketing reader
    pub fn new(config: &TicketingConfig, retry: RetryConfig) -> Result<Self> {
        let pool = crate::adapters::build_pool(&config.source, SYSTEM)?;
        Ok(Self {
            pool,
            retry,
            company_map: config.company_map.clone(),
        })
    }

    /// Report window: ticketing reports run from the previous day (exclusive)
    /// through the requested date (inclusive)
    fn window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = date.checked_sub_days(Days::new(1)).unwrap_or(date);
        (start, date)
    }

    async fn run_query(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> std::result::Result<Vec<Row>, SourceError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SourceError::ConnectionFailed {
                system: SYSTEM.to_string(),
                message: e.to_string(),
            })?;

        client
            .query(sql, params)
            .await
            .map_err(|e| SourceError::QueryFailed {
                system: SYSTEM.to_string(),
                message: e.to_string(),
            })
    }

    /// Runs a windowed per-agency query with retry, logging failures and
    /// surfacing them as "no data"
    async fn fetch_rows(
        &self,
        sql: &str,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<Row>> {
        if agency_name.trim().is_empty() {
            let e = SourceError::MissingParameter("agency_name".to_string());
            tracing::error!(error = %e, "Skipping ticketing lookup");
            return None;
        }

        let company_id = match company_id_for(&self.company_map, associated_company) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Skipping ticketing lookup");
                return None;
            }
        };
        let (start, end) = Self::window(date);

        let params: [&(dyn tokio_postgres::types::ToSql + Sync); 4] =
            [&start, &end, &agency_name, &company_id];
        match with_retry(SYSTEM, &self.retry, || self.run_query(sql, &params)).await
        {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::error!(
                    agency_name = agency_name,
                    error = %e,
                    "Could not fetch ticketing-system data"
                );
                None
            }
        }
    }
}

/// Translates an ERP company code to the ticketing-system company id
fn company_id_for(
    company_map: &BTreeMap<String, i64>,
    company: &CompanyCode,
) -> std::result::Result<i64, SourceError> {
    company_map.get(company.as_str()).copied().ok_or_else(|| {
        SourceError::MissingParameter(format!("ticketing company id for ERP company '{company}'"))
    })
}

fn decode_nature(raw: Option<String>) -> Option<EventNature> {
    match raw.as_deref().map(str::trim) {
        Some("R") => Some(EventNature::Revenue),
        Some("D") | Some("E") => Some(EventNature::Expense),
        _ => None,
    }
}

#[async_trait]
impl TicketingReader for PgTicketingReader {
    async fn fetch_external_receipts(
        &self,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<ExternalReceiptRecord>> {
        tracing::debug!(date = %date, agency_name = agency_name, "Fetching receipt aggregates");

        let rows = self
            .fetch_rows(queries::AGENCY_RECEIPTS, date, agency_name, associated_company)
            .await?;

        let records = rows
            .iter()
            .map(|row| ExternalReceiptRecord {
                fares: row.get::<_, Option<f64>>("fares_total").unwrap_or(0.0),
                boarding_tax: row
                    .get::<_, Option<f64>>("boarding_tax_total")
                    .unwrap_or(0.0),
                toll_tax: row.get::<_, Option<f64>>("toll_tax_total").unwrap_or(0.0),
                other_fees: row.get::<_, Option<f64>>("other_fees_total").unwrap_or(0.0),
                insurance: row.get::<_, Option<f64>>("insurance_total").unwrap_or(0.0),
            })
            .collect();

        Some(records)
    }

    async fn fetch_extra_events(
        &self,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<ExtraEvent>> {
        tracing::debug!(date = %date, agency_name = agency_name, "Fetching extra events");

        let rows = self
            .fetch_rows(
                queries::AGENCY_EXTRA_EVENTS,
                date,
                agency_name,
                associated_company,
            )
            .await?;

        let events = rows
            .iter()
            .map(|row| ExtraEvent {
                description: row
                    .get::<_, String>("bill_description")
                    .trim()
                    .to_string(),
                nature: decode_nature(row.get::<_, Option<String>>("nature")),
                total: row.get::<_, Option<f64>>("bill_value").unwrap_or(0.0),
            })
            .collect();

        Some(events)
    }

    async fn fetch_cancelled_aggregates(
        &self,
        date: NaiveDate,
        agency_name: &str,
        associated_company: &CompanyCode,
    ) -> Option<Vec<CancelledAggregate>> {
        tracing::debug!(date = %date, agency_name = agency_name, "Fetching cancelled aggregates");

        let rows = self
            .fetch_rows(
                queries::AGENCY_CANCELLED,
                date,
                agency_name,
                associated_company,
            )
            .await?;

        let aggregates = rows
            .iter()
            .map(|row| CancelledAggregate {
                total: row.get::<_, Option<f64>>("total").unwrap_or(0.0),
            })
            .collect();

        Some(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nature() {
        assert_eq!(decode_nature(Some("R".to_string())), Some(EventNature::Revenue));
        assert_eq!(decode_nature(Some(" D ".to_string())), Some(EventNature::Expense));
        assert_eq!(decode_nature(Some("E".to_string())), Some(EventNature::Expense));
        assert_eq!(decode_nature(Some("X".to_string())), None);
        assert_eq!(decode_nature(None), None);
    }

    #[test]
    fn test_unmapped_company_is_a_missing_parameter() {
        use std::str::FromStr;

        let map: BTreeMap<String, i64> = [("01".to_string(), 2i64)].into_iter().collect();
        let mapped = CompanyCode::from_str("01").unwrap();
        assert_eq!(company_id_for(&map, &mapped).unwrap(), 2);

        let unmapped = CompanyCode::from_str("99").unwrap();
        let err = company_id_for(&map, &unmapped).unwrap_err();
        assert!(matches!(err, SourceError::MissingParameter(_)));
        assert!(err.to_string().contains("'99'"));
    }

    #[test]
    fn test_window_is_previous_day_through_date() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 16).unwrap();
        let (start, end) = PgTicketingReader::window(date);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 4, 15).unwrap());
        assert_eq!(end, date);
    }
}
