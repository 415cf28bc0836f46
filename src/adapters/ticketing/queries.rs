//! SQL statements for the ticketing-system reader
//!
//! Ticketing reports cover a (exclusive, inclusive] day window, so every
//! statement takes a start and end date. Amounts are cast to float8 and
//! nullable sub-totals are coalesced on the Rust side.

/// Candidate receipt aggregates for one agency
pub const AGENCY_RECEIPTS: &str = "\
SELECT fares_total::float8        AS fares_total,
       boarding_tax_total::float8 AS boarding_tax_total,
       toll_tax_total::float8     AS toll_tax_total,
       other_fees_total::float8   AS other_fees_total,
       insurance_total::float8    AS insurance_total
  FROM agency_shipping_reports
 WHERE report_date > $1::date
   AND report_date <= $2::date
   AND agency_name = $3
   AND company_id = $4";

/// Extra revenue/expense events, one row per distinct description
pub const AGENCY_EXTRA_EVENTS: &str = "\
SELECT bill_description,
       nature,
       SUM(bill_value)::float8 AS bill_value
  FROM agency_extra_events
 WHERE event_date > $1::date
   AND event_date <= $2::date
   AND agency_name = $3
   AND company_id = $4
 GROUP BY bill_description, nature";

/// Cancelled/returned transaction aggregates
///
/// Sold, delivered, and transferred tickets are excluded: those count as
/// receipt and are already covered by the shipping report.
pub const AGENCY_CANCELLED: &str = "\
SELECT (bill_value + COALESCE(boarding_tax, 0) + COALESCE(other_fees, 0))::float8 AS total
  FROM agency_transactions
 WHERE transaction_date > $1::date
   AND transaction_date <= $2::date
   AND agency_name = $3
   AND company_id = $4
   AND bill_status = 'C'";
