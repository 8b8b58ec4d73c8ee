//! Time range handling.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A closed time interval for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A single instant.
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// Parse an ISO 8601 instant or interval.
    ///
    /// Supports:
    /// - Single time: "2024-01-15T12:00:00Z"
    /// - Interval: "2024-01-15T00:00:00Z/2024-01-16T00:00:00Z"
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        if let Some((start, end)) = s.split_once('/') {
            let start = parse_iso8601(start.trim())?;
            let end = parse_iso8601(end.trim())?;
            return Ok(Self::new(start, end));
        }

        parse_iso8601(s.trim()).map(Self::instant)
    }

    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// Start and end as seconds since the Unix epoch, the unit the
    /// dimension index stores time coordinates in.
    pub fn to_epoch_seconds(&self) -> (f64, f64) {
        (epoch_seconds(&self.start), epoch_seconds(&self.end))
    }
}

/// Seconds since the Unix epoch with sub-second precision.
pub fn epoch_seconds(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}

/// Parse an ISO 8601 datetime, assuming UTC when no offset is given.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_iso8601("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_iso8601("2024-01-15").unwrap();
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_interval() {
        let range = TimeRange::parse("2024-01-15T00:00:00Z/2024-01-16T00:00:00Z").unwrap();
        assert!(!range.is_instant());
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_epoch_seconds() {
        let range = TimeRange::instant(Utc.with_ymd_and_hms(1970, 1, 1, 0, 1, 0).unwrap());
        assert_eq!(range.to_epoch_seconds(), (60.0, 60.0));
    }

    #[test]
    fn test_reject_garbage() {
        assert!(TimeRange::parse("yesterday").is_err());
    }
}
