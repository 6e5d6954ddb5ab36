// SPDX-License-Identifier: MPL-2.0
//! Scrub/seek coordination.
//!
//! Seeks are not queued: a new request replaces one that has not reached the
//! decoder yet. The rate in effect when an interaction begins is kept so the
//! controller can decide whether to resume playback afterwards.

use std::time::Duration;

/// Seek waiting to be applied to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub target_position: Duration,
}

/// Playback rate captured right before a seek interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackRateSnapshot(f32);

impl PlaybackRateSnapshot {
    pub fn new(rate: f32) -> Self {
        Self(rate)
    }

    pub fn rate(self) -> f32 {
        self.0
    }

    /// True if playback was moving forward before the interaction.
    pub fn was_playing_forward(self) -> bool {
        self.0 > 0.0
    }
}

/// Tracks one scrub interaction and the pending seek.
#[derive(Debug, Default)]
pub struct ScrubCoordinator {
    pending: Option<SeekRequest>,
    rate_snapshot: Option<PlaybackRateSnapshot>,
    scrubbing: bool,
    superseded: u64,
}

impl ScrubCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a scrub, remembering the current rate.
    pub fn begin(&mut self, current_rate: f32) {
        self.scrubbing = true;
        self.capture_rate(current_rate);
    }

    /// Stores the rate without starting a scrub (used by pause).
    pub fn capture_rate(&mut self, current_rate: f32) {
        self.rate_snapshot = Some(PlaybackRateSnapshot::new(current_rate));
    }

    /// Records a new seek target, replacing any unapplied one.
    pub fn request_seek(&mut self, target_position: Duration) {
        if let Some(previous) = self.pending.replace(SeekRequest { target_position }) {
            self.superseded += 1;
            log::trace!(
                "Seek to {:?} superseded by {:?}",
                previous.target_position,
                target_position
            );
        }
    }

    /// Takes the pending seek, if any, for application to the decoder.
    pub fn take_pending(&mut self) -> Option<SeekRequest> {
        self.pending.take()
    }

    /// Pending seek that has not been applied yet.
    pub fn pending(&self) -> Option<SeekRequest> {
        self.pending
    }

    /// Ends the scrub and returns the rate captured when it began.
    pub fn end(&mut self) -> PlaybackRateSnapshot {
        self.scrubbing = false;
        self.rate_snapshot.take().unwrap_or_default()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Most recently captured rate, if not yet consumed.
    pub fn rate_snapshot(&self) -> Option<PlaybackRateSnapshot> {
        self.rate_snapshot
    }

    /// Number of seek requests dropped before reaching the decoder.
    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_seek_replaces_pending_one() {
        let mut scrub = ScrubCoordinator::new();
        scrub.request_seek(Duration::from_secs(30));
        scrub.request_seek(Duration::from_secs(45));

        assert_eq!(
            scrub.take_pending(),
            Some(SeekRequest {
                target_position: Duration::from_secs(45)
            })
        );
        assert_eq!(scrub.take_pending(), None);
        assert_eq!(scrub.superseded_count(), 1);
    }

    #[test]
    fn end_returns_rate_captured_at_begin() {
        let mut scrub = ScrubCoordinator::new();
        scrub.begin(1.0);
        assert!(scrub.is_scrubbing());

        let snapshot = scrub.end();
        assert!(!scrub.is_scrubbing());
        assert_eq!(snapshot.rate(), 1.0);
        assert!(snapshot.was_playing_forward());
        assert_eq!(scrub.rate_snapshot(), None);
    }

    #[test]
    fn end_without_begin_reports_paused_rate() {
        let mut scrub = ScrubCoordinator::new();
        assert!(!scrub.end().was_playing_forward());
    }

    #[test]
    fn rewinding_rate_is_not_forward_playback() {
        assert!(!PlaybackRateSnapshot::new(-3.0).was_playing_forward());
        assert!(!PlaybackRateSnapshot::new(0.0).was_playing_forward());
    }
}
