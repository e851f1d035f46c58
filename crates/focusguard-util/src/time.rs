//! Time utilities for focusguard
//!
//! Deadlines are enforced with monotonic time so that wall-clock changes
//! cannot shorten or extend a session. Wall-clock time is only used for
//! display (projected end time, deadline shown to the user).

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Get the current local time
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Represents a point in monotonic time for countdown enforcement.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }

    /// Returns duration until `self`, or zero if `self` is in the past
    pub fn saturating_duration_until(&self, from: MonotonicInstant) -> Duration {
        if self.0 > from.0 {
            self.0.duration_since(from.0)
        } else {
            Duration::ZERO
        }
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Format a countdown as `HH:MM:SS`
pub fn format_countdown(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Helper to format a pending duration the way the duration picker shows it
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Format a wall-clock time for display
pub fn format_clock_time(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_add_and_remaining() {
        let start = MonotonicInstant::now();
        let deadline = start + Duration::from_secs(300);

        assert_eq!(
            deadline.saturating_duration_until(start),
            Duration::from_secs(300)
        );
        assert_eq!(
            start.saturating_duration_until(deadline),
            Duration::ZERO
        );
    }

    #[test]
    fn countdown_is_zero_padded() {
        assert_eq!(format_countdown(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_countdown(Duration::from_secs(299)), "00:04:59");
        assert_eq!(format_countdown(Duration::from_secs(3723)), "01:02:03");
    }

    #[test]
    fn duration_display() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0m");
        assert_eq!(format_duration(Duration::from_secs(25 * 60)), "25m");
        assert_eq!(format_duration(Duration::from_secs(90 * 60)), "1h 30m");
    }
}
