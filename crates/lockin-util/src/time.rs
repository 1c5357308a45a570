//! Time utilities for lockind
//!
//! Lockdown deadlines are absolute wall-clock instants persisted as epoch
//! milliseconds, so they survive restarts and host suspension.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `LOCKIN_MOCK_TIME` environment variable can be set
//! to shift the wall clock for all time-sensitive operations.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! ```bash
//! LOCKIN_MOCK_TIME="2025-12-25 14:30:00" lockind
//! ```

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "LOCKIN_MOCK_TIME";

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, computed once at first use
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            match parse_mock_time(&raw) {
                Some(mock_dt) => {
                    let offset = mock_dt.signed_duration_since(chrono::Local::now());
                    tracing::info!(
                        mock_time = %raw,
                        offset_secs = offset.num_seconds(),
                        "Mock time enabled"
                    );
                    Some(offset)
                }
                None => {
                    tracing::warn!(
                        mock_time = %raw,
                        expected_format = MOCK_TIME_FORMAT,
                        "Invalid mock time, using system clock"
                    );
                    None
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Parse a mock time string in the local timezone
pub fn parse_mock_time(raw: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw, MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Current local time, respecting mock time in debug builds.
#[allow(clippy::disallowed_methods)] // the one sanctioned wrapper
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Milliseconds since the Unix epoch, as persisted in the session record
pub fn to_epoch_millis(dt: &DateTime<Local>) -> i64 {
    dt.timestamp_millis()
}

/// Inverse of [`to_epoch_millis`]; `None` if out of range
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(millis).single()
}

/// Length of a lockdown of `minutes`, or `None` when not strictly positive
pub fn lockdown_length(minutes: i64) -> Option<chrono::Duration> {
    if minutes <= 0 {
        return None;
    }
    chrono::Duration::try_minutes(minutes)
}

/// Time left until `deadline`, clamped at zero
pub fn remaining_until(deadline: &DateTime<Local>, now: &DateTime<Local>) -> Duration {
    deadline
        .signed_duration_since(*now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Countdown display: `H:MM:SS` with hours, `M:SS` without
pub fn format_countdown(d: Duration) -> String {
    let total = d.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn epoch_millis_round_trip() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        let millis = to_epoch_millis(&dt);
        assert_eq!(from_epoch_millis(millis), Some(dt));
    }

    #[test]
    fn lockdown_length_rejects_non_positive() {
        assert!(lockdown_length(0).is_none());
        assert!(lockdown_length(-5).is_none());
        assert_eq!(
            lockdown_length(30).unwrap().num_milliseconds(),
            30 * 60_000
        );
    }

    #[test]
    fn remaining_until_clamps_at_zero() {
        let now = Local.with_ymd_and_hms(2025, 12, 25, 14, 0, 0).unwrap();
        let later = now + chrono::Duration::seconds(90);

        assert_eq!(remaining_until(&later, &now), Duration::from_secs(90));
        assert_eq!(remaining_until(&now, &later), Duration::ZERO);
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(Duration::from_secs(5)), "0:05");
        assert_eq!(format_countdown(Duration::from_secs(25 * 60)), "25:00");
        assert_eq!(format_countdown(Duration::from_secs(3661)), "1:01:01");
    }

    #[test]
    fn datetime_full_formatting() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn mock_time_parsing() {
        let dt = parse_mock_time("2025-12-25 14:30:00").unwrap();
        assert_eq!(dt.day(), 25);
        assert!(parse_mock_time("25/12/2025").is_none());
    }

    #[test]
    fn now_returns_plausible_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
        let _ = is_mock_time_active();
    }
}
