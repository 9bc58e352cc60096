//! Terminal output for the LHU calendar
//!
//! Only consumes `CalendarEntry` values and fetch errors; nothing here feeds
//! back into retrieval.

pub mod schedule_table;

pub use schedule_table::{print_schedule, ScheduleTable};

use crate::data::FetchError;

/// Message shown when the window holds no classes
pub fn empty_schedule_message(day_range: u32) -> String {
    format!("Không có lịch học trong {} ngày tới", day_range)
}

/// User-facing message for a failed fetch
pub fn fetch_error_message(err: &FetchError) -> String {
    match err {
        FetchError::ConnectionFailure(_) => "Không thể kết nối, hãy kiểm tra lại mạng".to_string(),
        FetchError::RequestTimeout(_) => {
            "Kết nối hết thời gian chờ, hãy kiểm tra lại đường truyền mạng".to_string()
        }
        FetchError::FetchFailed { .. } => format!("Lỗi khi lấy hoặc hiển thị lịch: {}", err),
    }
}
