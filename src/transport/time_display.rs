// SPDX-License-Identifier: MPL-2.0
//! Time snapshots and label formatting for elapsed/remaining displays.
//!
//! Labels use the `[h:]m:ss[.d]` layout:
//! - the hour prefix only appears for media longer than an hour
//! - minutes are zero-padded only after an hour prefix, and shown as `00` when zero
//! - the elapsed label carries as many decimals as the refresh interval has

use super::RefreshInterval;
use std::time::Duration;

const SECS_PER_HOUR: f64 = 3600.0;
const SECS_PER_MINUTE: f64 = 60.0;

/// Playback position paired with the item's total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSnapshot {
    pub position: Duration,
    pub total_duration: Duration,
}

impl TimeSnapshot {
    pub fn new(position: Duration, total_duration: Duration) -> Self {
        Self {
            position,
            total_duration,
        }
    }

    /// Time left until the end of the item (zero past the end).
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.total_duration.saturating_sub(self.position)
    }

    /// Renders the elapsed and remaining labels for this snapshot.
    #[must_use]
    pub fn labels(&self, format: &TimeFormat) -> TimeLabels {
        let elapsed = format_time(self.position.as_secs_f64(), format.decimals);
        let remaining_secs = if format.auto_decrement_remaining {
            self.remaining().as_secs_f64()
        } else {
            self.total_duration.as_secs_f64()
        };

        TimeLabels {
            elapsed,
            remaining: format_time(remaining_secs, 0),
        }
    }
}

/// Formatting options for time labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormat {
    /// Decimals shown on the elapsed label.
    pub decimals: usize,
    /// Remaining label shows `duration - position` instead of `duration`.
    pub auto_decrement_remaining: bool,
}

impl TimeFormat {
    pub fn new(interval: RefreshInterval, auto_decrement_remaining: bool) -> Self {
        Self {
            decimals: interval.display_decimals(),
            auto_decrement_remaining,
        }
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self::new(RefreshInterval::default(), false)
    }
}

/// Rendered elapsed/remaining labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLabels {
    pub elapsed: String,
    pub remaining: String,
}

/// Formats seconds as `[h:]m:ss[.d]`.
///
/// # Examples
///
/// ```
/// use video_transport::transport::time_display::format_time;
///
/// assert_eq!(format_time(5.0, 0), "00:05");
/// assert_eq!(format_time(65.5, 1), "1:05.5");
/// assert_eq!(format_time(3725.0, 0), "1:02:05");
/// ```
pub fn format_time(secs: f64, decimals: usize) -> String {
    let mut seconds = if secs.is_finite() { secs.max(0.0) } else { 0.0 };

    let hours = (seconds / SECS_PER_HOUR) as u64;
    seconds -= hours as f64 * SECS_PER_HOUR;

    let minutes = (seconds / SECS_PER_MINUTE) as u64;
    seconds -= minutes as f64 * SECS_PER_MINUTE;

    let mut output = String::new();
    if hours > 0 {
        output.push_str(&format!("{}:", hours));
    }
    if minutes > 0 {
        if hours > 0 {
            output.push_str(&format!("{:02}", minutes));
        } else {
            output.push_str(&format!("{}", minutes));
        }
    } else {
        output.push_str("00");
    }

    let whole_secs = seconds as u64;
    output.push_str(&format!(":{:02}", whole_secs));

    if decimals > 0 {
        let fraction = seconds - whole_secs as f64;
        let scaled = (fraction * 10f64.powi(decimals as i32)) as u64;
        output.push_str(&format!(".{:0width$}", scaled, width = decimals));
    }

    output
}
