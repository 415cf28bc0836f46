//! SQL statements for the ERP reader
//!
//! Amounts are cast to float8 in SQL so row decoding stays uniform on the
//! Rust side.

/// All settlement tickets issued on a date
pub const TICKET_SUMMARY: &str = "\
SELECT agency_name,
       agency_code,
       associated_company,
       ticket_number,
       receipt::float8   AS receipt,
       expense::float8   AS expense,
       net_amount::float8 AS net_amount
  FROM settlement_tickets
 WHERE emission_date = $1::date
 ORDER BY agency_code, ticket_number";

/// Extra revenue/expense detail postings for one agency on a date
///
/// This does not list the agency's transacted tickets, only the
/// corroborating detail entries.
pub const TICKET_DETAIL: &str = "\
SELECT transaction_description,
       transaction_value::float8 AS transaction_value
  FROM settlement_ticket_details
 WHERE emission_date = $1::date
   AND agency_code = $2
   AND associated_company = $3
 ORDER BY transaction_description";
