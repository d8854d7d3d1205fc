//! Human-friendly rendering of mix timestamps.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use tracing::debug;

/// Describe a mix's `createdAt` relative to the local current time.
pub fn format_created_at(created_at: &str) -> String {
    format_created_at_in(created_at, Local::now())
}

/// Describe `created_at` relative to `now`, in `now`'s time zone:
/// "Today at 9:05 PM", "Yesterday at 12:00 AM", or "2024-01-01 at 3:30 PM".
pub fn format_created_at_in<Tz: TimeZone>(created_at: &str, now: DateTime<Tz>) -> String {
    let parsed = match DateTime::parse_from_rfc3339(created_at) {
        Ok(parsed) => parsed.with_timezone(&now.timezone()),
        Err(e) => {
            debug!(created_at, error = %e, "Unparsable mix timestamp");
            return "Invalid date".to_string();
        }
    };

    let today = now.date_naive();
    let day = parsed.date_naive();
    let time = clock_time(parsed.hour(), parsed.minute());

    if day >= today {
        format!("Today at {}", time)
    } else if Some(day) == today.pred_opt() {
        format!("Yesterday at {}", time)
    } else {
        format!(
            "{:04}-{:02}-{:02} at {}",
            day.year(),
            day.month(),
            day.day(),
            time
        )
    }
}

fn clock_time(hour: u32, minute: u32) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, minute, suffix)
}
