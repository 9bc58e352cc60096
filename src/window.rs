//! Date-window filtering of calendar entries

use chrono::{DateTime, Duration, Utc};

use crate::data::CalendarEntry;

/// End of the window that starts at `query_time` and spans `day_range` days
///
/// Saturates at the latest representable instant, leaving the window
/// unbounded above.
pub fn window_end(query_time: DateTime<Utc>, day_range: u32) -> DateTime<Utc> {
    query_time
        .checked_add_signed(Duration::days(i64::from(day_range)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Keeps the entries that lie entirely inside `[query_time, query_time + day_range days]`
///
/// Both bounds are inclusive and the input order is preserved.
pub fn filter_window(
    entries: Vec<CalendarEntry>,
    query_time: DateTime<Utc>,
    day_range: u32,
) -> Vec<CalendarEntry> {
    let end = window_end(query_time, day_range);
    entries
        .into_iter()
        .filter(|entry| entry.start_time() >= query_time && entry.end_time() <= end)
        .collect()
}
