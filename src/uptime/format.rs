//! Compact human-readable durations for uptime displays.

/// Format whole seconds as `45s`, `5m`, `2h 5m` or `3d 4h`.
///
/// Only the two most significant units are shown and a zero minor unit is
/// omitted (`2h`, `3d`). Negative inputs format as `0s`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let rem_minutes = minutes % 60;
    if hours < 24 {
        return if rem_minutes > 0 {
            format!("{hours}h {rem_minutes}m")
        } else {
            format!("{hours}h")
        };
    }
    let days = hours / 24;
    let rem_hours = hours % 24;
    if rem_hours > 0 {
        format!("{days}d {rem_hours}h")
    } else {
        format!("{days}d")
    }
}

/// Format whole seconds as `HH:MM:SS`, rolling past 24 hours.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_only_below_a_minute() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(-3), "0s");
    }

    #[test]
    fn minutes_drop_remaining_seconds() {
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(5 * 60 + 59), "5m");
    }

    #[test]
    fn hours_and_minutes() {
        assert_eq!(format_duration(2 * 3600 + 5 * 60), "2h 5m");
        assert_eq!(format_duration(2 * 3600), "2h");
    }

    #[test]
    fn days_and_hours() {
        assert_eq!(format_duration(3 * 86_400 + 4 * 3600 + 59), "3d 4h");
        assert_eq!(format_duration(86_400), "1d");
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3661), "01:01:01");
        assert_eq!(format_clock(90_000), "25:00:00");
    }
}
