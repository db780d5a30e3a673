//! Human-readable age of the freshness marker.

use chrono::{DateTime, Utc};

/// `"Never"` before the first refresh, otherwise a relative phrase such as
/// `"5 minutes ago"`. Markers in the future (clock skew) read as `"just now"`.
pub fn describe_last_refresh(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "Never".to_string();
    };

    let elapsed = now.signed_duration_since(last);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        plural(minutes, "minute")
    } else if days < 1 {
        plural(hours, "hour")
    } else {
        plural(days, "day")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
