//! Parsing helpers for loosely formatted MDM fields
//!
//! Each helper returns `Result<_, ParseError>`; none of them fall back to a
//! default on their own.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ParseError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp as UTC.
///
/// Accepts RFC 3339 with any offset, and naive date-times with or without a
/// trailing `Z`, which are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ParseError::Timestamp(raw.to_string()))
}

/// Parse a percentage string such as `"72%"` into a whole number
pub fn parse_percentage(raw: &str) -> Result<u32, ParseError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Percentage(raw.to_string()));
    }

    digits
        .parse()
        .map_err(|_| ParseError::Percentage(raw.to_string()))
}
