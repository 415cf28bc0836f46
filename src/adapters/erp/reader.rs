//! Postgres-backed ERP reader

use super::queries;
use crate::adapters::retry::with_retry;
use crate::adapters::traits::ErpReader;
use crate::config::{RetryConfig, SourceConfig};
use crate::core::reconcile::CategoryMatcher;
use crate::domain::ids::{AgencyCode, CompanyCode, TicketNumber};
use crate::domain::ticket::{DetailTransaction, Ticket};
use crate::domain::{Result, SourceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

const SYSTEM: &str = "erp";

/// Reader for the ERP settlement tables
///
/// Detail rows are categorized at ingestion using the configured pattern
/// table, so downstream comparison logic never touches raw descriptions for
/// category decisions.
pub struct PgErpReader {
    pool: Pool,
    retry: RetryConfig,
    categories: CategoryMatcher,
}

impl PgErpReader {
    /// Creates a new ERP reader
    pub fn new(config: &SourceConfig, retry: RetryConfig, categories: CategoryMatcher) -> Result<Self> {
        let pool = crate::adapters::build_pool(config, SYSTEM)?;
        Ok(Self {
            pool,
            retry,
            categories,
        })
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

    fn decode_ticket(row: &Row) -> std::result::Result<Ticket, SourceError> {
        let invalid = |message: String| SourceError::InvalidRow {
            system: SYSTEM.to_string(),
            message,
        };

        let agency_name: String = row.get("agency_name");
        let agency_code = AgencyCode::new(row.get::<_, String>("agency_code")).map_err(&invalid)?;
        let associated_company =
            CompanyCode::new(row.get::<_, String>("associated_company")).map_err(&invalid)?;
        let ticket_number =
            TicketNumber::new(row.get::<_, String>("ticket_number")).map_err(&invalid)?;

        Ok(Ticket {
            agency_name: agency_name.trim().to_string(),
            agency_code,
            associated_company,
            ticket_number,
            receipt: row.get::<_, Option<f64>>("receipt").unwrap_or(0.0),
            expense: row.get::<_, Option<f64>>("expense").unwrap_or(0.0),
            net: row.get::<_, Option<f64>>("net_amount").unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl ErpReader for PgErpReader {
    async fn fetch_ticket_summary(&self, date: NaiveDate) -> Result<Vec<Ticket>> {
        tracing::debug!(date = %date, "Fetching settlement ticket summary");

        let params: [&(dyn tokio_postgres::types::ToSql + Sync); 1] = [&date];
        let rows = with_retry(SYSTEM, &self.retry, || {
            self.run_query(queries::TICKET_SUMMARY, &params)
        })
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in &rows {
            tickets.push(Self::decode_ticket(row)?);
        }

        tracing::info!(date = %date, count = tickets.len(), "Fetched ticket summary");
        Ok(tickets)
    }

    async fn fetch_ticket_detail(
        &self,
        date: NaiveDate,
        agency_code: &AgencyCode,
        associated_company: &CompanyCode,
    ) -> Option<Vec<DetailTransaction>> {
        tracing::debug!(
            date = %date,
            agency_code = %agency_code,
            "Fetching ticket detail transactions"
        );

        let agency = agency_code.as_str();
        let company = associated_company.as_str();
        let params: [&(dyn tokio_postgres::types::ToSql + Sync); 3] = [&date, &agency, &company];
        let rows = match with_retry(SYSTEM, &self.retry, || {
            self.run_query(queries::TICKET_DETAIL, &params)
        })
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    agency_code = %agency_code,
                    error = %e,
                    "Could not fetch ticket detail"
                );
                return None;
            }
        };

        let details = rows
            .iter()
            .map(|row| {
                let description: String = row.get("transaction_description");
                let description = description.trim().to_string();
                let category = self.categories.categorize(&description);
                DetailTransaction {
                    value: row
                        .get::<_, Option<f64>>("transaction_value")
                        .unwrap_or(0.0),
                    description,
                    category,
                }
            })
            .collect();

        Some(details)
    }
}
