//! Timestamp parsing and display formatting for API dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse the timestamp shapes the dashboard deals with: RFC 3339 from the
/// API, `YYYY-MM-DDTHH:MM[:SS]` from a datetime-local input, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a date for tables, e.g. `"Jan 5, 2024"`.
pub fn format_date(value: &str) -> String {
    if value.trim().is_empty() {
        return "N/A".to_string();
    }

    match parse_timestamp(value) {
        | Some(dt) => dt.format("%b %-d, %Y").to_string(),
        | None => "Invalid Date".to_string(),
    }
}
