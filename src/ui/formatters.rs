use chrono::{DateTime, FixedOffset, Utc};
use humansize::{format_size as human_format_size, BINARY};

/// Format a byte count in human-readable form (KiB, MiB, GiB)
pub fn format_size(size: u64) -> String {
    human_format_size(size, BINARY)
}

/// Format a byte rate, e.g. `1.50 MiB/s`
pub fn format_rate(bytes_per_sec: f64) -> String {
    let bytes = if bytes_per_sec.is_finite() && bytes_per_sec > 0.0 {
        bytes_per_sec.round() as u64
    } else {
        0
    };
    format!("{}/s", format_size(bytes))
}

/// How long ago an event happened, coarse enough for a status line
pub fn format_age(timestamp: &DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let secs = now
        .signed_duration_since(timestamp.with_timezone(&Utc))
        .num_seconds()
        .max(0);

    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h {}m ago", secs / 3600, (secs % 3600) / 60)
    }
}

/// Format timestamp in local time (HH:MM:SS)
pub fn format_clock(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0 B/s");
        assert_eq!(format_rate(-5.0), "0 B/s");
        assert_eq!(format_rate(f64::NAN), "0 B/s");
        assert_eq!(format_rate(2048.0), "2 KiB/s");
    }

    #[test]
    fn test_format_age() {
        let now = DateTime::parse_from_rfc3339("2026-10-19T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap();

        assert_eq!(format_age(&at("2026-10-19T11:59:30+00:00"), now), "30s ago");
        assert_eq!(format_age(&at("2026-10-19T13:45:00+02:00"), now), "15m ago");
        assert_eq!(format_age(&at("2026-10-19T09:30:00+00:00"), now), "2h 30m ago");
        assert_eq!(format_age(&at("2026-10-19T12:05:00+00:00"), now), "0s ago");
    }
}
