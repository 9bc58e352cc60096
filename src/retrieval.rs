//! Cache-backed schedule retrieval
//!
//! [`ScheduleRetriever`] ties the pieces together: it looks the query up in
//! the disk cache, falls back to the remote source on a miss, narrows the
//! result to the requested window and stores it for next time.
//!
//! Fetch errors are returned to the caller unchanged and never cached. Cache
//! problems never reach the caller; they only turn a hit into a miss.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::CacheManager;
use crate::data::{CalendarEntry, CalendarSource, FetchError};
use crate::datetime::Normalize;
use crate::window::{filter_window, window_end};

/// Chance that a lookup first sweeps expired cache files
pub const DEFAULT_CLEANUP_PROBABILITY: f64 = 0.1;

/// When a request sweeps expired cache files before its lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CleanupPolicy {
    Never,
    Always,
    /// Sweep with the given probability (0.0 to 1.0) on each request
    Probabilistic(f64),
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        CleanupPolicy::Probabilistic(DEFAULT_CLEANUP_PROBABILITY)
    }
}

impl CleanupPolicy {
    fn should_run(self) -> bool {
        match self {
            CleanupPolicy::Never => false,
            CleanupPolicy::Always => true,
            CleanupPolicy::Probabilistic(p) => fastrand::f64() < p,
        }
    }
}

/// A schedule request: a start instant and a number of days after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    query_time: DateTime<Utc>,
    day_range: u32,
}

impl Query {
    /// Creates a query, anchoring `query_time` to UTC
    pub fn new(query_time: impl Normalize, day_range: u32) -> Self {
        Self {
            query_time: query_time.normalize(),
            day_range,
        }
    }

    /// Creates a query starting at the current instant
    pub fn now(day_range: u32) -> Self {
        Self::new(Utc::now(), day_range)
    }

    pub fn query_time(&self) -> DateTime<Utc> {
        self.query_time
    }

    pub fn day_range(&self) -> u32 {
        self.day_range
    }

    /// Last instant admitted by the query window
    pub fn window_end(&self) -> DateTime<Utc> {
        window_end(self.query_time, self.day_range)
    }
}

/// Fetches schedules through a disk cache
#[derive(Debug)]
pub struct ScheduleRetriever<S> {
    source: S,
    cache: Option<CacheManager>,
    cleanup: CleanupPolicy,
}

impl<S: CalendarSource> ScheduleRetriever<S> {
    /// Creates a retriever; with `cache` set to `None` every request goes to
    /// the network
    pub fn new(source: S, cache: Option<CacheManager>) -> Self {
        Self {
            source,
            cache,
            cleanup: CleanupPolicy::default(),
        }
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the sessions that fall inside the query window
    ///
    /// # Returns
    /// * `Ok(Vec<CalendarEntry>)` - Cached or freshly fetched entries
    /// * `Err(FetchError)` - The cache had nothing usable and the fetch failed
    pub async fn get_schedule(&self, query: Query) -> Result<Vec<CalendarEntry>, FetchError> {
        let endpoint = self.source.endpoint();
        let subject = self.source.subject();
        let query_time = query.query_time();
        let day_range = query.day_range();

        if let Some(ref cache) = self.cache {
            if self.cleanup.should_run() {
                let removed = cache.clear_expired::<Vec<CalendarEntry>>();
                debug!(removed, "opportunistic cache cleanup");
            }

            if let Some(entries) = cache.get::<Vec<CalendarEntry>>(endpoint, subject, query_time, day_range) {
                return Ok(entries);
            }
        }

        let fetched = self.source.fetch(query_time).await?;
        let fetched_count = fetched.len();
        let entries = filter_window(fetched, query_time, day_range);
        debug!(fetched = fetched_count, kept = entries.len(), "filtered schedule to window");

        if let Some(ref cache) = self.cache {
            cache.set(endpoint, subject, query_time, day_range, &entries);
        }

        Ok(entries)
    }
}
