// SPDX-License-Identifier: MPL-2.0
//! Scripted collaborators for driving a [`TransportController`] without a
//! real decoder or UI.
//!
//! - [`ScriptedDecoder`] records every command and is steered through the
//!   [`DecoderProbe`] it shares state with
//! - [`RecordingSurface`] remembers what the controller pushed to the controls
//! - [`EventLog`] collects emitted [`TransportEvent`]s
//!
//! The demo binary and the benches use these as well as the tests.
//!
//! [`TransportController`]: crate::transport::TransportController

use crate::decoder::{BufferedRange, DecoderEvent, DecoderEventSink, MediaDecoder, MediaSource};
use crate::events::{ControlsSurface, TransportEvent};
use crate::transport::time_display::{TimeLabels, TimeSnapshot};
use crate::transport::PlaybackState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Command received by a [`ScriptedDecoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderCall {
    Attach(String),
    ReplaceItem(String),
    Play,
    Pause,
    SetRate(f32),
    Seek(Duration),
    CancelPendingSeeks,
    AddBoundaryObserver(Duration),
    RemoveBoundaryObserver,
    Subscribe,
    Unsubscribe,
    /// The decoder handle was dropped.
    Released,
}

#[derive(Debug, Default)]
struct DecoderState {
    calls: Vec<DecoderCall>,
    rate: f32,
    position: Duration,
    buffered: Option<BufferedRange>,
    boundary: Option<Duration>,
    sink: Option<DecoderEventSink>,
}

/// Decoder double that plays nothing and records every command.
#[derive(Debug)]
pub struct ScriptedDecoder {
    state: Arc<Mutex<DecoderState>>,
}

impl ScriptedDecoder {
    /// Creates a decoder and the probe controlling it.
    pub fn new() -> (Self, DecoderProbe) {
        let state = Arc::new(Mutex::new(DecoderState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            DecoderProbe { state },
        )
    }

    fn record(&self, call: DecoderCall) -> MutexGuard<'_, DecoderState> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state
    }
}

impl MediaDecoder for ScriptedDecoder {
    fn attach(&mut self, source: &MediaSource) {
        self.record(DecoderCall::Attach(source.location().to_string()));
    }

    fn replace_item(&mut self, source: &MediaSource) {
        let mut state = self.record(DecoderCall::ReplaceItem(source.location().to_string()));
        state.position = Duration::ZERO;
        state.rate = 0.0;
    }

    fn play(&mut self) {
        self.record(DecoderCall::Play).rate = 1.0;
    }

    fn pause(&mut self) {
        self.record(DecoderCall::Pause).rate = 0.0;
    }

    fn rate(&self) -> f32 {
        lock(&self.state).rate
    }

    fn set_rate(&mut self, rate: f32) {
        self.record(DecoderCall::SetRate(rate)).rate = rate;
    }

    fn seek(&mut self, target: Duration) {
        self.record(DecoderCall::Seek(target)).position = target;
    }

    fn cancel_pending_seeks(&mut self) {
        self.record(DecoderCall::CancelPendingSeeks);
    }

    fn position(&self) -> Duration {
        lock(&self.state).position
    }

    fn buffered_range(&self) -> Option<BufferedRange> {
        lock(&self.state).buffered
    }

    fn add_boundary_observer(&mut self, at: Duration) {
        self.record(DecoderCall::AddBoundaryObserver(at)).boundary = Some(at);
    }

    fn remove_boundary_observer(&mut self) {
        self.record(DecoderCall::RemoveBoundaryObserver).boundary = None;
    }

    fn subscribe(&mut self, sink: DecoderEventSink) {
        self.record(DecoderCall::Subscribe).sink = Some(sink);
    }

    fn unsubscribe(&mut self) {
        self.record(DecoderCall::Unsubscribe).sink = None;
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        self.record(DecoderCall::Released);
    }
}

/// Test-side handle of a [`ScriptedDecoder`].
#[derive(Debug, Clone)]
pub struct DecoderProbe {
    state: Arc<Mutex<DecoderState>>,
}

impl DecoderProbe {
    /// Every command received so far, oldest first.
    pub fn calls(&self) -> Vec<DecoderCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Seek targets received so far, oldest first.
    pub fn seeks(&self) -> Vec<Duration> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                DecoderCall::Seek(target) => Some(*target),
                _ => None,
            })
            .collect()
    }

    pub fn rate(&self) -> f32 {
        lock(&self.state).rate
    }

    pub fn position(&self) -> Duration {
        lock(&self.state).position
    }

    pub fn set_position(&self, position: Duration) {
        lock(&self.state).position = position;
    }

    pub fn set_buffered(&self, range: Option<BufferedRange>) {
        lock(&self.state).buffered = range;
    }

    /// Boundary observer currently registered.
    pub fn boundary(&self) -> Option<Duration> {
        lock(&self.state).boundary
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.state).sink.is_some()
    }

    /// Sends `event` through the subscribed sink. Returns false if nobody listens.
    pub fn emit(&self, event: DecoderEvent) -> bool {
        let sink = lock(&self.state).sink.clone();
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Fires the boundary observer once, if registered.
    pub fn cross_boundary(&self) -> bool {
        let registered = lock(&self.state).boundary.take().is_some();
        registered && self.emit(DecoderEvent::BoundaryCrossed)
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    playing: Option<bool>,
    snapshots: Vec<TimeSnapshot>,
    labels: Option<TimeLabels>,
    completions: usize,
}

/// Controls surface that remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    state: Mutex<SurfaceState>,
}

impl RecordingSurface {
    /// Last play/pause indicator value, if ever set.
    pub fn playing_indicator(&self) -> Option<bool> {
        lock(&self.state).playing
    }

    pub fn snapshots(&self) -> Vec<TimeSnapshot> {
        lock(&self.state).snapshots.clone()
    }

    pub fn last_labels(&self) -> Option<TimeLabels> {
        lock(&self.state).labels.clone()
    }

    pub fn completions(&self) -> usize {
        lock(&self.state).completions
    }
}

impl ControlsSurface for RecordingSurface {
    fn set_playing_indicator(&self, playing: bool) {
        lock(&self.state).playing = Some(playing);
    }

    fn show_time(&self, snapshot: &TimeSnapshot, labels: &TimeLabels) {
        let mut state = lock(&self.state);
        state.snapshots.push(*snapshot);
        state.labels = Some(labels.clone());
    }

    fn playback_complete(&self) {
        let mut state = lock(&self.state);
        state.playing = Some(false);
        state.completions += 1;
    }
}

/// Shared collector of emitted events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TransportEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener appending to this log.
    pub fn listener(&self) -> impl FnMut(&TransportEvent) + Send + 'static {
        let events = Arc::clone(&self.events);
        move |event: &TransportEvent| lock(&events).push(event.clone())
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        lock(&self.events).clone()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    pub fn count(&self, predicate: impl Fn(&TransportEvent) -> bool) -> usize {
        lock(&self.events).iter().filter(|event| predicate(event)).count()
    }

    /// State transitions as `(previous, current)` pairs.
    pub fn states(&self) -> Vec<(PlaybackState, PlaybackState)> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TransportEvent::StateChanged { previous, current } => Some((*previous, *current)),
                _ => None,
            })
            .collect()
    }

    pub fn time_updates(&self) -> Vec<TimeSnapshot> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TransportEvent::TimeUpdated(snapshot) => Some(*snapshot),
                _ => None,
            })
            .collect()
    }

    pub fn visibility_changes(&self) -> Vec<bool> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TransportEvent::ControlsVisibilityChanged { visible } => Some(*visible),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_records_commands_and_tracks_rate() {
        let (mut decoder, probe) = ScriptedDecoder::new();

        decoder.play();
        decoder.set_rate(3.0);
        decoder.seek(Duration::from_secs(4));

        assert_eq!(
            probe.calls(),
            vec![
                DecoderCall::Play,
                DecoderCall::SetRate(3.0),
                DecoderCall::Seek(Duration::from_secs(4)),
            ]
        );
        assert_eq!(probe.rate(), 3.0);
        assert_eq!(decoder.position(), Duration::from_secs(4));
    }

    #[test]
    fn boundary_crosses_once() {
        let (mut decoder, probe) = ScriptedDecoder::new();
        let (sink, mut rx) = DecoderEventSink::channel();
        decoder.subscribe(sink);
        decoder.add_boundary_observer(Duration::from_millis(100));

        assert!(probe.cross_boundary());
        assert!(!probe.cross_boundary());
        assert_eq!(rx.try_recv().ok(), Some(DecoderEvent::BoundaryCrossed));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emit_without_subscriber_is_dropped() {
        let (_decoder, probe) = ScriptedDecoder::new();
        assert!(!probe.emit(DecoderEvent::Stalled));
    }
}
