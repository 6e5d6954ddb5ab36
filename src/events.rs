// SPDX-License-Identifier: MPL-2.0
//! Outbound notifications from the transport controller.
//!
//! Two channels reach the UI side:
//! - [`TransportEvent`]s delivered to listeners registered on one controller
//!   instance (no process-wide broadcast)
//! - an optional [`ControlsSurface`] the controller drives directly for the
//!   play/pause indicator and time labels, held through a `Weak` reference

use crate::error::DecoderError;
use crate::transport::time_display::{TimeLabels, TimeSnapshot};
use crate::transport::PlaybackState;
use std::fmt;

/// Event emitted by the transport controller.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Playback state changed. Never emitted for no-op writes.
    StateChanged {
        previous: PlaybackState,
        current: PlaybackState,
    },

    /// Controls overlay was shown or hidden.
    ControlsVisibilityChanged { visible: bool },

    /// Playback crossed the first-frame boundary (fires once per controller).
    FirstFrameRendered,

    /// Elapsed time refresh, or an optimistic update while scrubbing.
    TimeUpdated(TimeSnapshot),

    /// The media item failed to load.
    LoadFailed(DecoderError),

    /// Playback finished (end of item or stop).
    PlaybackComplete,
}

/// Identifier returned by [`EventListeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&TransportEvent) + Send>;

/// Registered event handlers, invoked in subscription order.
#[derive(Default)]
pub struct EventListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns its id.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&TransportEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a handler. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Delivers `event` to every handler.
    pub fn emit(&mut self, event: &TransportEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

/// UI-side controls the controller keeps in sync.
///
/// The controller holds this through a `Weak` reference and never keeps the
/// surface alive. All methods default to no-ops.
pub trait ControlsSurface: Send + Sync {
    /// Play/pause indicator: true shows the "pause" affordance.
    fn set_playing_indicator(&self, _playing: bool) {}

    /// New time snapshot with its rendered labels.
    fn show_time(&self, _snapshot: &TimeSnapshot, _labels: &TimeLabels) {}

    /// Playback finished; the indicator should return to "play".
    fn playback_complete(&self) {}
}
