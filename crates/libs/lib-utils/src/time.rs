//! # Time Utilities
//!
//! Wall-clock helpers. Persisted timestamps are epoch milliseconds so they
//! survive a reload and compare cheaply against `now_millis()`.

use chrono::Utc;

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Milliseconds elapsed since `since_millis`, clamped at zero when the clock
/// moved backwards.
pub fn elapsed_millis(since_millis: i64) -> u64 {
    now_millis().saturating_sub(since_millis).max(0) as u64
}
