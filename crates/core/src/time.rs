//! Unix-millisecond timestamps
//!
//! All stored timestamps are `u64` milliseconds since the Unix epoch.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as milliseconds since the Unix epoch
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Convert whole minutes to milliseconds
pub const fn minutes_to_ms(minutes: u64) -> u64 {
    minutes * 60 * 1000
}

/// Convert whole hours to milliseconds
pub const fn hours_to_ms(hours: u64) -> u64 {
    hours * 60 * 60 * 1000
}
