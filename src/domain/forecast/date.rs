use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::DomainError;

/// Normalize a request date to a calendar day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_forecast_date(value: &str) -> Result<NaiveDate, DomainError> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }

    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(timestamp.date());
    }

    Err(DomainError::invalid_date(value))
}
