//! Core data models for the LHU calendar
//!
//! This module holds the class-session model shared by the fetcher, the cache
//! and the renderer, plus the [`CalendarSource`] seam the retrieval pipeline
//! fetches through.

pub mod lhu;

pub use lhu::{FetchError, LhuClient};

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a session would end before it starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("calendar entry ends at {end} before it starts at {start}")]
pub struct InvertedSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One scheduled class session
///
/// Fields are private so an entry cannot be altered after construction; both
/// [`CalendarEntry::new`] and deserialization reject `end_time < start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalendarEntryFields")]
pub struct CalendarEntry {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    room_name: String,
    subject_name: String,
    facility_name: String,
}

/// Unchecked mirror of `CalendarEntry` used on the deserialization path
#[derive(Deserialize)]
struct CalendarEntryFields {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    room_name: String,
    subject_name: String,
    facility_name: String,
}

impl TryFrom<CalendarEntryFields> for CalendarEntry {
    type Error = InvertedSpan;

    fn try_from(f: CalendarEntryFields) -> Result<Self, Self::Error> {
        CalendarEntry::new(
            f.start_time,
            f.end_time,
            f.room_name,
            f.subject_name,
            f.facility_name,
        )
    }
}

impl CalendarEntry {
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        room_name: impl Into<String>,
        subject_name: impl Into<String>,
        facility_name: impl Into<String>,
    ) -> Result<Self, InvertedSpan> {
        if end_time < start_time {
            return Err(InvertedSpan {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            start_time,
            end_time,
            room_name: room_name.into(),
            subject_name: subject_name.into(),
            facility_name: facility_name.into(),
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn facility_name(&self) -> &str {
        &self.facility_name
    }
}

/// Boxed future returned by [`CalendarSource::fetch`]
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<CalendarEntry>, FetchError>> + Send + 'a>>;

/// A remote schedule provider
///
/// `endpoint` and `subject` identify the provider and the student; together
/// with the query they make up the cache key.
pub trait CalendarSource: Send + Sync {
    /// URL (or other stable identity) of the remote service
    fn endpoint(&self) -> &str;

    /// Student identifier the schedule is fetched for
    fn subject(&self) -> &str;

    /// Fetches and parses every session the service returns for `query_time`
    fn fetch<'a>(&'a self, query_time: DateTime<Utc>) -> FetchFuture<'a>;
}
