//! Time normalization helpers
//!
//! Every instant that takes part in cache key derivation or window comparison
//! is anchored to UTC first, so the same logical query always hashes the same
//! way no matter which entry point produced it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Anchors a timestamp to UTC.
///
/// Naive timestamps are assumed to already be in UTC and have the zone
/// attached without shifting the wall clock. Zone-aware timestamps are
/// converted.
pub trait Normalize {
    fn normalize(self) -> DateTime<Utc>;
}

impl Normalize for NaiveDateTime {
    fn normalize(self) -> DateTime<Utc> {
        self.and_utc()
    }
}

impl<Tz: TimeZone> Normalize for DateTime<Tz> {
    fn normalize(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

/// Parses a timestamp string as sent by the calendar service.
///
/// The service reports wall-clock times without a zone (e.g.
/// `2025-12-23T09:30:00`). They are read as naive values and anchored to UTC,
/// the same way query times are. If an offset is present anyway it is dropped
/// and the wall-clock reading kept.
pub fn parse_source_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let s = s.trim();
    let naive = match s.parse::<NaiveDateTime>() {
        Ok(naive) => naive,
        Err(iso_err) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
            Ok(naive) => naive,
            Err(_) => match DateTime::parse_from_rfc3339(s) {
                Ok(aware) => aware.naive_local(),
                Err(_) => return Err(iso_err),
            },
        },
    };
    Ok(naive.normalize())
}

/// Parses a `YYYY-MM-DD` date into midnight of that day.
pub fn parse_query_date(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}
