use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{AvailabilityError, Result};

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
        AvailabilityError::Validation(format!("date '{}' is not YYYY-MM-DD: {}", date, e))
    })
}

pub fn parse_time(time: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|e| {
        AvailabilityError::Validation(format!("start time '{}' is not HH:MM: {}", time, e))
    })
}

pub fn parse_date_time(date: &str, time: &str) -> Result<NaiveDateTime> {
    Ok(parse_date(date)?.and_time(parse_time(time)?))
}

/// Timestamp form the booking calendar expects, e.g. `2026-02-03T10:00:00.000Z`.
pub fn format_booking_timestamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S.000Z").to_string()
}
