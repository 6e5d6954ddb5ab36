// SPDX-License-Identifier: MPL-2.0
//! Clock and timer service for the transport controller.
//!
//! Timers are cooperative: nothing fires on its own. The owner advances the
//! virtual clock with [`TimerService::pop_due`] and dispatches each fired
//! [`TimerPurpose`] on its own serial context. This keeps every state
//! mutation on one thread and makes timing fully deterministic in tests.
//!
//! # Invariants
//!
//! - At most one timer is outstanding per purpose; scheduling replaces.
//! - A [`TimerToken`] only cancels the exact timer it was issued for.
//! - Timers due at the same instant fire in scheduling order.

use std::collections::HashMap;
use std::time::Duration;

/// What a timer is for. Each purpose owns at most one pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Periodic elapsed-time refresh.
    TimeRefresh,
    /// Buffered-range re-check while stalled.
    StallRecovery,
    /// One-shot hide of the controls overlay.
    ControlsAutoHide,
}

/// Cancellation token for one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    purpose: TimerPurpose,
    generation: u64,
}

impl TimerToken {
    pub fn purpose(&self) -> TimerPurpose {
        self.purpose
    }
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFire {
    pub purpose: TimerPurpose,
    /// Virtual time at which the timer was due.
    pub at: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: Duration,
    period: Option<Duration>,
    generation: u64,
}

/// Virtual clock plus one timer slot per purpose.
#[derive(Debug, Default)]
pub struct TimerService {
    now: Duration,
    next_generation: u64,
    timers: HashMap<TimerPurpose, Scheduled>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules a one-shot timer `delay` from now, replacing any pending one.
    pub fn schedule_once(&mut self, purpose: TimerPurpose, delay: Duration) -> TimerToken {
        let due = self.now.saturating_add(delay);
        self.insert(purpose, due, None)
    }

    /// Schedules a one-shot timer at an absolute virtual time, replacing any pending one.
    ///
    /// A deadline in the past fires on the next [`pop_due`](Self::pop_due).
    pub fn schedule_at(&mut self, purpose: TimerPurpose, due: Duration) -> TimerToken {
        self.insert(purpose, due, None)
    }

    /// Schedules a repeating timer whose first tick is one `period` from now.
    ///
    /// A zero period is bumped to one millisecond so the clock always advances.
    pub fn schedule_repeating(&mut self, purpose: TimerPurpose, period: Duration) -> TimerToken {
        let period = period.max(Duration::from_millis(1));
        let due = self.now.saturating_add(period);
        self.insert(purpose, due, Some(period))
    }

    fn insert(&mut self, purpose: TimerPurpose, due: Duration, period: Option<Duration>) -> TimerToken {
        self.next_generation += 1;
        let generation = self.next_generation;
        if self
            .timers
            .insert(
                purpose,
                Scheduled {
                    due,
                    period,
                    generation,
                },
            )
            .is_some()
        {
            log::trace!("Replaced pending {:?} timer", purpose);
        }
        TimerToken {
            purpose,
            generation,
        }
    }

    /// Cancels whatever timer is pending for `purpose`. Returns true if one was pending.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        self.timers.remove(&purpose).is_some()
    }

    /// Cancels the timer identified by `token`, if it is still the pending one.
    pub fn cancel_token(&mut self, token: TimerToken) -> bool {
        match self.timers.get(&token.purpose) {
            Some(scheduled) if scheduled.generation == token.generation => {
                self.timers.remove(&token.purpose);
                true
            }
            _ => false,
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_scheduled(&self, purpose: TimerPurpose) -> bool {
        self.timers.contains_key(&purpose)
    }

    /// Virtual time at which `purpose` fires next.
    pub fn deadline(&self, purpose: TimerPurpose) -> Option<Duration> {
        self.timers.get(&purpose).map(|scheduled| scheduled.due)
    }

    /// Earliest pending deadline across all purposes.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.values().map(|scheduled| scheduled.due).min()
    }

    /// Number of pending timers.
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Pops the earliest timer due at or before `until`.
    ///
    /// The clock moves to the timer's deadline (never backwards). Repeating
    /// timers are rescheduled one period later before being returned, so the
    /// handler may cancel them. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerFire> {
        let (purpose, scheduled) = self
            .timers
            .iter()
            .filter(|(_, scheduled)| scheduled.due <= until)
            .min_by_key(|(_, scheduled)| (scheduled.due, scheduled.generation))
            .map(|(purpose, scheduled)| (*purpose, *scheduled))?;

        self.now = self.now.max(scheduled.due);

        match scheduled.period {
            Some(period) => {
                self.next_generation += 1;
                self.timers.insert(
                    purpose,
                    Scheduled {
                        due: scheduled.due.saturating_add(period),
                        period: Some(period),
                        generation: self.next_generation,
                    },
                );
            }
            None => {
                self.timers.remove(&purpose);
            }
        }

        Some(TimerFire {
            purpose,
            at: scheduled.due,
        })
    }

    /// Moves the clock forward to `until` without firing anything.
    ///
    /// Callers drain [`pop_due`](Self::pop_due) first.
    pub fn advance_clock(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
