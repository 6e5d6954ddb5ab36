// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all transport constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Time display**: Refresh interval for elapsed/remaining labels
//! - **Stall recovery**: Re-check interval and playable buffer threshold
//! - **Seeking**: Fast-forward/rewind rate multiplier
//! - **Controls**: Auto-hide display duration
//! - **First frame**: Boundary offset confirming the first rendered frame

// ==========================================================================
// Time Display Defaults
// ==========================================================================

/// Default interval between time-display refresh ticks (in seconds).
pub const DEFAULT_TIME_DISPLAY_REFRESH_SECS: f64 = 1.0;

/// Maximum number of decimals rendered in the elapsed time label.
pub const MAX_TIME_DISPLAY_DECIMALS: usize = 6;

// ==========================================================================
// Stall Recovery Defaults
// ==========================================================================

/// Interval between buffered-range checks while stalled (in seconds).
pub const STALL_RECOVERY_INTERVAL_SECS: f64 = 2.0;

/// Buffered media length that must be exceeded before playback resumes (in seconds).
pub const PLAYABLE_BUFFER_THRESHOLD_SECS: f64 = 1.0;

// ==========================================================================
// Seeking Defaults
// ==========================================================================

/// Rate applied while fast-forward or rewind is held.
pub const SEEK_RATE: f32 = 3.0;

/// Normal forward playback rate.
pub const NORMAL_PLAYBACK_RATE: f32 = 1.0;

// ==========================================================================
// Controls Defaults
// ==========================================================================

/// Default controls display duration (in seconds). Zero disables auto-hide.
pub const DEFAULT_CONTROLS_DISPLAY_DURATION_SECS: f64 = 0.0;

// ==========================================================================
// First Frame Defaults
// ==========================================================================

/// Position whose crossing confirms that the first frame was rendered (in seconds).
pub const FIRST_FRAME_BOUNDARY_SECS: f64 = 0.1;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(DEFAULT_TIME_DISPLAY_REFRESH_SECS > 0.0);
    assert!(MAX_TIME_DISPLAY_DECIMALS > 0);

    assert!(STALL_RECOVERY_INTERVAL_SECS > 0.0);
    assert!(PLAYABLE_BUFFER_THRESHOLD_SECS > 0.0);

    assert!(SEEK_RATE > NORMAL_PLAYBACK_RATE);
    assert!(NORMAL_PLAYBACK_RATE > 0.0);

    assert!(DEFAULT_CONTROLS_DISPLAY_DURATION_SECS >= 0.0);

    assert!(FIRST_FRAME_BOUNDARY_SECS > 0.0);
    assert!(FIRST_FRAME_BOUNDARY_SECS < DEFAULT_TIME_DISPLAY_REFRESH_SECS);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_display_defaults_are_valid() {
        assert_eq!(DEFAULT_TIME_DISPLAY_REFRESH_SECS, 1.0);
        assert!(MAX_TIME_DISPLAY_DECIMALS >= 1);
    }

    #[test]
    fn stall_defaults_match_recovery_policy() {
        assert_eq!(STALL_RECOVERY_INTERVAL_SECS, 2.0);
        assert_eq!(PLAYABLE_BUFFER_THRESHOLD_SECS, 1.0);
    }

    #[test]
    fn seek_rate_is_faster_than_normal_playback() {
        assert_eq!(SEEK_RATE, 3.0);
        assert!(SEEK_RATE > NORMAL_PLAYBACK_RATE);
    }

    #[test]
    fn controls_auto_hide_is_disabled_by_default() {
        assert_eq!(DEFAULT_CONTROLS_DISPLAY_DURATION_SECS, 0.0);
    }
}
