// src/utils/time.rs

//! Wall-clock helpers pinned to the vendor's local time (UTC+8).

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

/// Offset of the vendor's local time from UTC, in hours.
pub const LOCAL_OFFSET_HOURS: i32 = 8;

/// Format for full timestamps (report header).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format for estimated end times.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// Format `now + delta_minutes` in UTC+8 using a strftime pattern.
pub fn format_local(now: DateTime<Utc>, delta_minutes: i64, fmt: &str) -> String {
    (now + Duration::minutes(delta_minutes))
        .with_timezone(&local_offset())
        .format(fmt)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_local_applies_offset_and_delta() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 50, 0).unwrap();
        assert_eq!(format_local(now, 0, DATETIME_FORMAT), "2024-03-01 23:50:00");
        assert_eq!(format_local(now, 45, MINUTE_FORMAT), "2024-03-02 00:35");
    }
}
