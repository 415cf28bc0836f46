//! Monetary comparison helpers
//!
//! All value comparisons run at two-decimal precision in integer cents so that
//! float noise from upstream aggregation cannot flip a classification. Rounding
//! is half away from zero, matching how both source systems print amounts.

/// Rounds a monetary value to integer cents (half away from zero)
pub fn cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// True when both values agree at two-decimal precision
pub fn amounts_match(a: f64, b: f64) -> bool {
    cents(a) == cents(b)
}

/// True when the value rounds to exactly zero cents
pub fn is_zero(value: f64) -> bool {
    cents(value) == 0
}
