//! ERP date encoding helpers
//!
//! The material master stores change dates as 8-digit `YYYYMMDD` strings.

use chrono::{DateTime, NaiveDate, Utc};

/// Parse an 8-digit `YYYYMMDD` ERP date into midnight UTC.
///
/// Returns `None` for anything that is not exactly eight ASCII digits naming a
/// valid calendar date.
///
/// # Examples
///
/// ```
/// use matsync_domain::utils::erp_date::parse_erp_date;
///
/// let parsed = parse_erp_date("20240102").unwrap();
/// assert_eq!(parsed.to_rfc3339(), "2024-01-02T00:00:00+00:00");
/// assert!(parse_erp_date("2024-01-02").is_none());
/// assert!(parse_erp_date("20241302").is_none());
/// ```
pub fn parse_erp_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp as an ERP `YYYYMMDD` date (UTC calendar day).
pub fn format_erp_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d").to_string()
}

/// Format a calendar date as `YYYYMMDD`.
pub fn format_erp_day(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
