//! LHU Calendar library
//!
//! Cache-backed retrieval of a student's class schedule. Exposed as a library
//! so the binary and the integration tests share the same modules.

pub mod cache;
pub mod cli;
pub mod data;
pub mod datetime;
pub mod retrieval;
pub mod ui;
pub mod window;

pub use data::{CalendarEntry, CalendarSource, FetchError, LhuClient};
pub use retrieval::{CleanupPolicy, Query, ScheduleRetriever};
