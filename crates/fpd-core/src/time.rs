//! Human-readable timestamps for dashboard display.

use chrono::{DateTime, Local, Utc};

/// Formats `at` relative to `now`.
///
/// "Just now" under a minute, then "Nm ago", then "Nh ago" under a day,
/// and finally the local calendar date. Timestamps in the future count as
/// "Just now".
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(at).num_seconds();

    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        at.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}
