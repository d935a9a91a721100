// Date and timestamp literals
// Parsing and canonical formatting for the `date` and `timestamp` wire forms

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use thiserror::Error;

/// DateTime errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateTimeError {
    #[error("unable to parse date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("unable to parse timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate, DateTimeError> {
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| DateTimeError::InvalidDate {
        value: s.to_string(),
        reason: e.to_string(),
    })?;
    // chrono accepts signs and unpadded fields; the wire form does not
    if format_date(&date) != s {
        return Err(DateTimeError::InvalidDate {
            value: s.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        });
    }
    Ok(date)
}

/// Parse an RFC 3339 timestamp, normalizing it to UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DateTimeError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DateTimeError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a bare interval bound; a `T` separator marks a timestamp
pub fn parse_instant(s: &str) -> Result<InstantLiteral, DateTimeError> {
    if s.contains('T') {
        parse_timestamp(s).map(InstantLiteral::Timestamp)
    } else {
        parse_date(s).map(InstantLiteral::Date)
    }
}

/// Date or timestamp given as bare text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstantLiteral {
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Format as RFC 3339 in UTC with a `Z` suffix and the fraction trimmed of
/// trailing zeros (`.5Z`, `.882Z`, no fraction for whole seconds)
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    let mut text = dt.to_rfc3339_opts(SecondsFormat::Nanos, true);
    text.pop();
    if let Some(dot) = text.rfind('.') {
        let end = text.trim_end_matches('0').len();
        text.truncate(if end == dot + 1 { dot } else { end });
    }
    text.push('Z');
    text
}
