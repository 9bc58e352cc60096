//! LHU calendar API client
//!
//! Posts a schedule query to the university calendar endpoint and parses the
//! rows it returns into [`CalendarEntry`] values.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::{CalendarEntry, CalendarSource, FetchFuture};
use crate::datetime::parse_source_datetime;

/// Public endpoint of the LHU student calendar
pub const DEFAULT_API_URL: &str = "https://tapi.lhu.edu.vn/calen/auth/XemLich_LichSinhVien";

/// Deadline applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const PAGE_INDEX: u32 = 1;
const PAGE_SIZE: u32 = 30;

/// Position of the row collection inside the top-level `data` array
const ROWS_INDEX: usize = 2;

/// Errors that can occur when fetching the schedule
#[derive(Debug, Error)]
pub enum FetchError {
    /// The connection to the server could not be established
    #[error("connection failed: {0}")]
    ConnectionFailure(String),

    /// The request did not complete within the deadline
    #[error("request timed out after {} seconds", .0.as_secs_f32())]
    RequestTimeout(Duration),

    /// The server answered with an error status or an unexpected body
    #[error("fetch failed: {reason}")]
    FetchFailed { status: Option<u16>, reason: String },
}

impl FetchError {
    fn from_status(status: StatusCode) -> Self {
        FetchError::FetchFailed {
            status: Some(status.as_u16()),
            reason: format!(
                "status code: {}, reason: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            ),
        }
    }

    fn malformed(status: StatusCode, context: impl std::fmt::Display) -> Self {
        FetchError::FetchFailed {
            status: Some(status.as_u16()),
            reason: format!("malformed response: {}", context),
        }
    }

    /// HTTP status attached to a `FetchFailed` error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::FetchFailed { status, .. } => *status,
            _ => None,
        }
    }
}

/// Formats the query instant as the endpoint expects in the `Ngay` field
///
/// `YYYY-MM-DD HH:MM:SS+00:00`, with microseconds only when non-zero.
fn format_request_date(query_time: DateTime<Utc>) -> String {
    if query_time.nanosecond() / 1_000 == 0 {
        query_time.format("%Y-%m-%d %H:%M:%S%:z").to_string()
    } else {
        query_time.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string()
    }
}

/// Form body expected by the calendar endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScheduleRequest<'a> {
    #[serde(rename = "StudentID")]
    student_id: &'a str,
    ngay: String,
    page_index: u32,
    page_size: u32,
}

/// A single row of the calendar response
#[derive(Debug, Deserialize)]
struct ScheduleRow {
    #[serde(rename = "ThoiGianBD")]
    start: String,
    #[serde(rename = "ThoiGianKT")]
    end: String,
    #[serde(rename = "TenPhong", default)]
    room: Option<String>,
    #[serde(rename = "TenMonHoc", default)]
    subject: Option<String>,
    #[serde(rename = "TenCoSo", default)]
    facility: Option<String>,
}

impl ScheduleRow {
    fn into_entry(self) -> Result<CalendarEntry, String> {
        let start = parse_source_datetime(&self.start)
            .map_err(|e| format!("invalid ThoiGianBD {:?}: {}", self.start, e))?;
        let end = parse_source_datetime(&self.end)
            .map_err(|e| format!("invalid ThoiGianKT {:?}: {}", self.end, e))?;

        CalendarEntry::new(
            start,
            end,
            self.room.unwrap_or_default(),
            self.subject.unwrap_or_default(),
            self.facility.unwrap_or_default(),
        )
        .map_err(|e| e.to_string())
    }
}

/// Parses a response body into calendar entries
///
/// Rows live at `data[2]`; anything else about the body is ignored.
fn parse_schedule(body: &str) -> Result<Vec<CalendarEntry>, String> {
    let mut value: Value =
        serde_json::from_str(body).map_err(|e| format!("body is not JSON: {}", e))?;

    let rows = value
        .get_mut("data")
        .and_then(|data| data.get_mut(ROWS_INDEX))
        .map(Value::take)
        .ok_or_else(|| format!("missing data[{}]", ROWS_INDEX))?;

    let rows: Vec<ScheduleRow> =
        serde_json::from_value(rows).map_err(|e| format!("unexpected row shape: {}", e))?;

    rows.into_iter().map(ScheduleRow::into_entry).collect()
}

/// Client for the LHU calendar endpoint
#[derive(Debug, Clone)]
pub struct LhuClient {
    http_client: Client,
    endpoint: String,
    student_id: String,
    timeout: Duration,
}

impl LhuClient {
    /// Creates a client for `student_id` against `endpoint`
    pub fn new(endpoint: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.into(),
            student_id: student_id.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Replaces the underlying HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Overrides the request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches every session the service lists for `query_time`
    ///
    /// # Returns
    /// * `Ok(Vec<CalendarEntry>)` - Parsed rows, in response order
    /// * `Err(FetchError)` - Connection, timeout, status or body failure
    pub async fn fetch_schedule(
        &self,
        query_time: DateTime<Utc>,
    ) -> Result<Vec<CalendarEntry>, FetchError> {
        let request = ScheduleRequest {
            student_id: &self.student_id,
            ngay: format_request_date(query_time),
            page_index: PAGE_INDEX,
            page_size: PAGE_SIZE,
        };

        debug!(endpoint = %self.endpoint, %query_time, "requesting schedule");

        let response = self
            .http_client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .form(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "schedule request rejected");
            return Err(FetchError::from_status(status));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let entries = parse_schedule(&body).map_err(|context| FetchError::malformed(status, context))?;

        debug!(rows = entries.len(), "schedule parsed");
        Ok(entries)
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::RequestTimeout(self.timeout)
        } else if err.is_connect() {
            FetchError::ConnectionFailure(err.to_string())
        } else {
            FetchError::FetchFailed {
                status: err.status().map(|s| s.as_u16()),
                reason: err.to_string(),
            }
        }
    }
}

impl CalendarSource for LhuClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn subject(&self) -> &str {
        &self.student_id
    }

    fn fetch<'a>(&'a self, query_time: DateTime<Utc>) -> FetchFuture<'a> {
        Box::pin(self.fetch_schedule(query_time))
    }
}
