//! Time and timestamp utilities
//!
//! Timestamps cross the persistence boundary as epoch seconds (`f64`) and are
//! handled as `DateTime<Utc>` everywhere else. Conversions keep microsecond
//! resolution.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Accepted layouts for dates without an explicit offset (interpreted as UTC)
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MICROS_PER_SECOND: f64 = 1_000_000.0;
const MICROS_PER_HOUR: f64 = 3_600_000_000.0;

/// Error returned by [`parse_date`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid date format: {0}")]
pub struct InvalidDate(pub String);

/// Parse a date string into a UTC timestamp
///
/// Accepts RFC 3339 (`2025-05-01T10:00:00+02:00`), ISO 8601 without offset
/// (`2025-05-01T10:00:00`), `2025-05-01 10:00` and a bare `2025-05-01`
/// (midnight). Offset-less inputs are taken as UTC.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| InvalidDate(input.to_string()))
}

/// Convert to epoch seconds for storage
pub fn to_epoch_seconds(dt: DateTime<Utc>) -> f64 {
    dt.timestamp_micros() as f64 / MICROS_PER_SECOND
}

/// Convert stored epoch seconds back, rounding to the nearest microsecond
pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    let micros = (secs * MICROS_PER_SECOND).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

/// Convert a duration in hours, rejecting negative and non-finite values
pub fn hours_to_delta(hours: f64) -> Option<TimeDelta> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let micros = (hours * MICROS_PER_HOUR).round();
    if micros >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_iso_without_offset() {
        let dt = parse_date("2025-05-01T10:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_date("2025-05-01T10:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_space_separated() {
        let dt = parse_date("2025-05-01 10:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_date("2025-05-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date("next tuesday").is_err());
        assert!(parse_date("2025-13-01T10:00:00").is_err());
    }

    #[test]
    fn test_epoch_seconds_keep_sub_second_precision() {
        let dt = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap() + TimeDelta::microseconds(250_001);
        let secs = to_epoch_seconds(dt);
        assert_eq!(from_epoch_seconds(secs), Some(dt));
    }

    #[test]
    fn test_from_epoch_seconds_rejects_nan() {
        assert!(from_epoch_seconds(f64::NAN).is_none());
        assert!(from_epoch_seconds(f64::INFINITY).is_none());
    }

    #[test]
    fn test_hours_to_delta() {
        assert_eq!(hours_to_delta(1.5), Some(TimeDelta::minutes(90)));
        assert_eq!(hours_to_delta(0.0), Some(TimeDelta::zero()));
        assert!(hours_to_delta(-0.5).is_none());
        assert!(hours_to_delta(f64::NAN).is_none());
    }
}
