// SPDX-License-Identifier: MPL-2.0
//! Playback state machine for the transport controller.
//!
//! Manages the lifecycle of a media item with clear state transitions:
//! - Unknown: Nothing attached yet, or playback was stopped
//! - Loading: Item attached, waiting for the decoder to become ready
//! - ReadyToPlay: Item loaded and paused (also after pause and end of item)
//! - Playing: Decoder is rendering frames
//! - Stalled: Playback interrupted because the buffer ran dry
//! - Failed: The decoder reported a failure for the current item

use std::fmt;

/// Playback state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// No item attached, or playback was stopped.
    #[default]
    Unknown,
    /// Item attached, decoder still loading.
    Loading,
    /// Item loaded and ready, not playing.
    ReadyToPlay,
    /// Actively playing.
    Playing,
    /// Waiting for enough buffered media to resume.
    Stalled,
    /// Decoder reported a failure.
    Failed,
}

impl PlaybackState {
    /// Returns true if the transport is playing.
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns true while the decoder is still loading the item.
    #[must_use]
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if the item failed.
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if playback is active or will resume on its own.
    #[must_use]
    pub fn is_playing_or_will_resume(self) -> bool {
        matches!(self, Self::Playing | Self::Stalled)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Loading => "loading",
            Self::ReadyToPlay => "ready",
            Self::Playing => "playing",
            Self::Stalled => "stalled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateWrite {
    pub previous: PlaybackState,
    pub current: PlaybackState,
    /// False when the write repeated the current value.
    pub changed: bool,
}

/// Holder of the current playback state.
///
/// Every write is compared with the previous value so that repeated writes
/// of the same state can be told apart from real transitions.
#[derive(Debug, Default)]
pub struct StateMachine {
    current: PlaybackState,
    transitions: usize,
}

impl StateMachine {
    /// Creates a state machine in `Unknown`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn current(&self) -> PlaybackState {
        self.current
    }

    /// Number of writes that actually changed the state.
    pub fn transition_count(&self) -> usize {
        self.transitions
    }

    /// Writes a new state and reports whether it changed.
    pub fn set(&mut self, next: PlaybackState) -> StateWrite {
        let previous = self.current;
        let changed = previous != next;
        if changed {
            log::debug!("Playback state {} -> {}", previous, next);
            self.current = next;
            self.transitions += 1;
        }
        StateWrite {
            previous,
            current: next,
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(PlaybackState::default(), PlaybackState::Unknown);
        assert_eq!(StateMachine::new().current(), PlaybackState::Unknown);
    }

    #[test]
    fn state_checks() {
        assert!(PlaybackState::Playing.is_playing());
        assert!(!PlaybackState::Stalled.is_playing());

        assert!(PlaybackState::Loading.is_loading());
        assert!(PlaybackState::Failed.is_failed());

        assert!(PlaybackState::Stalled.is_playing_or_will_resume());
        assert!(!PlaybackState::ReadyToPlay.is_playing_or_will_resume());
    }

    #[test]
    fn set_reports_change() {
        let mut machine = StateMachine::new();
        let write = machine.set(PlaybackState::Loading);

        assert!(write.changed);
        assert_eq!(write.previous, PlaybackState::Unknown);
        assert_eq!(write.current, PlaybackState::Loading);
        assert_eq!(machine.current(), PlaybackState::Loading);
    }

    #[test]
    fn repeated_write_is_not_a_transition() {
        let mut machine = StateMachine::new();
        machine.set(PlaybackState::Loading);
        let write = machine.set(PlaybackState::Loading);

        assert!(!write.changed);
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn display_names() {
        assert_eq!(PlaybackState::ReadyToPlay.to_string(), "ready");
        assert_eq!(PlaybackState::Stalled.to_string(), "stalled");
    }
}
