// SPDX-License-Identifier: MPL-2.0
//! Stall detection and recovery policy.
//!
//! When the decoder reports a stall, a repeating recovery timer re-checks
//! the most recently buffered range. As soon as more than the playable
//! threshold is buffered, the timer is cancelled and playback resumes.

use crate::config::{PLAYABLE_BUFFER_THRESHOLD_SECS, STALL_RECOVERY_INTERVAL_SECS};
use crate::decoder::BufferedRange;
use crate::timer::{TimerPurpose, TimerService};
use std::time::Duration;

/// Outcome of one recovery check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCheck {
    /// Enough media is buffered; the recovery timer was cancelled.
    Recovered,
    /// Still not enough media buffered.
    StillStalled { buffered: Duration },
}

/// Buffered-range sufficiency check plus the recovery timer lifecycle.
#[derive(Debug, Clone)]
pub struct StallDetector {
    interval: Duration,
    threshold: Duration,
    checks_since_stall: u32,
}

impl StallDetector {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs_f64(STALL_RECOVERY_INTERVAL_SECS),
            threshold: Duration::from_secs_f64(PLAYABLE_BUFFER_THRESHOLD_SECS),
            checks_since_stall: 0,
        }
    }

    /// Interval between recovery checks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Buffered length that must be exceeded to resume.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Number of recovery checks since the last stall began.
    pub fn checks_since_stall(&self) -> u32 {
        self.checks_since_stall
    }

    /// True if the most recent buffered range is long enough to play.
    pub fn has_playable_material(&self, range: Option<BufferedRange>) -> bool {
        range.is_some_and(|range| range.length > self.threshold)
    }

    /// Starts (or restarts) the repeating recovery timer.
    pub fn start_recovery(&mut self, timers: &mut TimerService) {
        self.checks_since_stall = 0;
        timers.schedule_repeating(TimerPurpose::StallRecovery, self.interval);
        log::debug!("Stall recovery checks every {:?}", self.interval);
    }

    /// Cancels the recovery timer. Returns true if it was running.
    pub fn cancel(&mut self, timers: &mut TimerService) -> bool {
        timers.cancel(TimerPurpose::StallRecovery)
    }

    /// True while the recovery timer is pending.
    pub fn is_recovering(&self, timers: &TimerService) -> bool {
        timers.is_scheduled(TimerPurpose::StallRecovery)
    }

    /// Runs one recovery check against the latest buffered range.
    pub fn check(
        &mut self,
        range: Option<BufferedRange>,
        timers: &mut TimerService,
    ) -> RecoveryCheck {
        self.checks_since_stall += 1;
        if self.has_playable_material(range) {
            self.cancel(timers);
            log::info!(
                "Recovered from stall after {} check(s)",
                self.checks_since_stall
            );
            RecoveryCheck::Recovered
        } else {
            let buffered = range.map(|range| range.length).unwrap_or_default();
            log::debug!("Still stalled, {:?} buffered", buffered);
            RecoveryCheck::StillStalled { buffered }
        }
    }
}

impl Default for StallDetector {
    fn default() -> Self {
        Self::new()
    }
}
