//! Usage: Wall-clock helpers (unix seconds, local display timestamps).

use chrono::{Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local time rendered as `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn local_display_timestamp() -> String {
    Local::now().format(DISPLAY_FORMAT).to_string()
}

/// Same as `local_display_timestamp`, for a given unix second. Out-of-range input
/// falls back to the current time.
pub(crate) fn local_display_timestamp_at(unix_seconds: i64) -> String {
    match Local.timestamp_opt(unix_seconds, 0).single() {
        Some(at) => at.format(DISPLAY_FORMAT).to_string(),
        None => local_display_timestamp(),
    }
}
