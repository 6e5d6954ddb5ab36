// SPDX-License-Identifier: MPL-2.0
//! Controls visibility policy.
//!
//! Decides when the controls overlay is shown or hidden and owns the
//! auto-hide timer. Auto-hide is suppressed while a seek or scrub is in
//! progress and disabled entirely with a zero display duration.

use crate::timer::{TimerPurpose, TimerService};
use std::time::Duration;

/// Visibility flag, display duration and seek suppression.
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    display_duration: Duration,
    seek_in_progress: bool,
}

impl ControlsVisibility {
    /// Controls start visible.
    pub fn new(display_duration: Duration) -> Self {
        Self {
            visible: true,
            display_duration,
            seek_in_progress: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn display_duration(&self) -> Duration {
        self.display_duration
    }

    pub fn is_seek_in_progress(&self) -> bool {
        self.seek_in_progress
    }

    /// Updates the display duration. Zero cancels a pending hide.
    pub fn set_display_duration(&mut self, duration: Duration, timers: &mut TimerService) {
        self.display_duration = duration;
        if duration.is_zero() {
            self.cancel_auto_hide(timers);
        }
    }

    /// Marks a seek or scrub as in progress (suppresses auto-hide).
    pub fn set_seek_in_progress(&mut self, in_progress: bool) {
        self.seek_in_progress = in_progress;
    }

    /// Shows the controls. Returns true if visibility changed.
    ///
    /// Already visible controls only re-arm the auto-hide timer.
    pub fn show(&mut self, timers: &mut TimerService) -> bool {
        let changed = !self.visible;
        self.visible = true;
        self.evaluate_auto_hide(timers);
        changed
    }

    /// Hides the controls. Returns true if visibility changed.
    ///
    /// Hidden controls are left untouched; otherwise auto-hide is
    /// re-evaluated after hiding.
    pub fn hide(&mut self, timers: &mut TimerService) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.evaluate_auto_hide(timers);
        true
    }

    /// Schedules a one-shot hide if allowed.
    ///
    /// Skipped while seeking or with a zero display duration. At most one
    /// hide is pending: an existing one is replaced by a timer with the same
    /// deadline, so repeated evaluations never push the hide further out.
    pub fn evaluate_auto_hide(&mut self, timers: &mut TimerService) {
        if self.seek_in_progress || self.display_duration.is_zero() {
            return;
        }

        match timers.deadline(TimerPurpose::ControlsAutoHide) {
            Some(deadline) => {
                timers.schedule_at(TimerPurpose::ControlsAutoHide, deadline);
            }
            None => {
                timers.schedule_once(TimerPurpose::ControlsAutoHide, self.display_duration);
            }
        }
    }

    /// Cancels a pending hide. Returns true if one was pending.
    pub fn cancel_auto_hide(&mut self, timers: &mut TimerService) -> bool {
        timers.cancel(TimerPurpose::ControlsAutoHide)
    }
}
