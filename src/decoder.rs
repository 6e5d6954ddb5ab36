// SPDX-License-Identifier: MPL-2.0
//! Decoder port definition.
//!
//! This module defines the [`MediaDecoder`] trait that the transport
//! controller drives. Real implementations wrap a platform player or a
//! software decoder; the controller never decodes or renders anything itself.
//!
//! # Design Notes
//!
//! - The decoder is **stateful**: it owns the current item, position and rate
//! - Methods are not `async`; asynchronous notifications are pushed through a
//!   [`DecoderEventSink`] and marshalled onto the controller's owner task
//! - Commands never fail; failures surface as [`DecoderEvent::StatusFailed`]

use crate::error::DecoderError;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

/// Reference to the media the controller plays (file path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaSource(String);

impl MediaSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn location(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contiguous span of media data already available for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferedRange {
    pub start: Duration,
    pub length: Duration,
}

impl BufferedRange {
    pub fn new(start: Duration, length: Duration) -> Self {
        Self { start, length }
    }

    /// End of the buffered span.
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.length)
    }
}

/// Notifications emitted by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    /// The current item finished loading and can be played.
    StatusReady {
        /// Total duration of the item.
        duration: Duration,
    },

    /// The current item failed to load or play.
    StatusFailed(DecoderError),

    /// Playback stopped because the buffer ran dry.
    Stalled,

    /// Playback reached the end of the item.
    ReachedEnd,

    /// Playback crossed the registered boundary position.
    BoundaryCrossed,
}

/// Cloneable handle the decoder uses to deliver [`DecoderEvent`]s.
///
/// Events may be emitted from any thread; the receiving side lives on the
/// controller's owner task.
#[derive(Clone)]
pub struct DecoderEventSink {
    tx: mpsc::UnboundedSender<DecoderEvent>,
}

impl DecoderEventSink {
    /// Creates a sink and the receiver the owner task reads from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DecoderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Delivers an event. Returns false once the owner is gone.
    pub fn emit(&self, event: DecoderEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Returns true if the owner task no longer listens.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for DecoderEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderEventSink")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Port for the media decoder/renderer the transport controls.
///
/// # Lifecycle
///
/// 1. `attach()` creates the item for a source and starts loading it
/// 2. The decoder reports `StatusReady` or `StatusFailed`
/// 3. `play()`, `pause()`, `set_rate()` and `seek()` drive playback
/// 4. `replace_item()` re-creates the item after a failure
/// 5. `unsubscribe()` and `remove_boundary_observer()` run before the handle is dropped
pub trait MediaDecoder: Send {
    /// Creates the playable item for `source` and starts loading it.
    fn attach(&mut self, source: &MediaSource);

    /// Replaces the current item with a fresh one for `source`.
    fn replace_item(&mut self, source: &MediaSource);

    /// Starts playback at the current rate.
    fn play(&mut self);

    /// Pauses playback (rate becomes zero).
    fn pause(&mut self);

    /// Current playback rate (0 when paused, negative when rewinding).
    fn rate(&self) -> f32;

    /// Sets the playback rate. A non-zero rate starts playback.
    fn set_rate(&mut self, rate: f32);

    /// Seeks to `target`.
    fn seek(&mut self, target: Duration);

    /// Drops seeks issued earlier that have not completed yet.
    fn cancel_pending_seeks(&mut self);

    /// Current playback position.
    fn position(&self) -> Duration;

    /// Most recently buffered contiguous range, if any.
    fn buffered_range(&self) -> Option<BufferedRange>;

    /// Registers a one-shot observer firing `BoundaryCrossed` when playback crosses `at`.
    fn add_boundary_observer(&mut self, at: Duration);

    /// Removes the boundary observer, if still registered.
    fn remove_boundary_observer(&mut self);

    /// Starts delivering events to `sink`.
    fn subscribe(&mut self, sink: DecoderEventSink);

    /// Stops delivering events.
    fn unsubscribe(&mut self);
}
