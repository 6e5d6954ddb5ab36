// SPDX-License-Identifier: MPL-2.0
//! Time-display refresh interval domain type.
//!
//! This module provides a type-safe wrapper for the interval between
//! elapsed-time refresh ticks. The interval also determines how many
//! decimals the elapsed label shows.

use crate::config::{DEFAULT_TIME_DISPLAY_REFRESH_SECS, MAX_TIME_DISPLAY_DECIMALS};
use std::time::Duration;

/// Refresh interval in seconds, guaranteed to be positive and finite.
///
/// Invalid values are not rejected: they silently fall back to the default.
///
/// # Example
///
/// ```
/// use video_transport::transport::RefreshInterval;
///
/// let interval = RefreshInterval::new(0.5);
/// assert_eq!(interval.secs(), 0.5);
///
/// // Non-positive values reset to the default
/// let invalid = RefreshInterval::new(0.0);
/// assert_eq!(invalid.secs(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshInterval(f64);

impl RefreshInterval {
    /// Creates a new refresh interval, falling back to the default when invalid.
    #[must_use]
    pub fn new(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self(secs)
        } else {
            log::debug!(
                "Invalid refresh interval {}; using {}s",
                secs,
                DEFAULT_TIME_DISPLAY_REFRESH_SECS
            );
            Self::default()
        }
    }

    /// Returns the interval in seconds.
    #[must_use]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Returns the interval as a Duration, saturating at `Duration::MAX`.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::try_from_secs_f64(self.0).unwrap_or(Duration::MAX)
    }

    /// Number of decimals the elapsed label should carry.
    ///
    /// Counts the fractional digits of the interval's shortest representation,
    /// with a minimum of one (`1.0` gives 1, `0.25` gives 2).
    #[must_use]
    pub fn display_decimals(self) -> usize {
        let repr = format!("{:?}", self.0);
        let decimals = repr
            .split_once('.')
            .map(|(_, frac)| frac.trim_end_matches(|c: char| !c.is_ascii_digit()).len())
            .unwrap_or(0);
        decimals.clamp(1, MAX_TIME_DISPLAY_DECIMALS)
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(DEFAULT_TIME_DISPLAY_REFRESH_SECS)
    }
}
