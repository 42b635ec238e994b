//! Timestamp parsing for request boundaries.
//!
//! Accepted forms, all normalized to UTC:
//!
//! - `2025-01-02T09:00` (naive, read as UTC)
//! - `2025-01-02T09:00:00` (naive, read as UTC)
//! - RFC 3339, e.g. `2025-01-02T10:00:00+01:00`

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// A timestamp that matched none of the accepted forms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid timestamp '{input}': expected YYYY-MM-DDTHH:MM, YYYY-MM-DDTHH:MM:SS or RFC 3339")]
pub struct TimestampError {
    input: String,
}

/// Parse a boundary timestamp.
///
/// # Errors
///
/// Returns [`TimestampError`] if `input` matches none of the accepted forms.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError {
            input: input.to_string(),
        })
}
