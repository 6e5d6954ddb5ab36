// SPDX-License-Identifier: MPL-2.0
//! Transport command facade.
//!
//! [`TransportController`] is the single owner of the playback state, the
//! timer service and the decoder handle. The UI issues commands against it,
//! the decoder feeds it [`DecoderEvent`]s and the owner advances its virtual
//! clock; all three happen on one serial context (see [`crate::runtime`]).

use super::controls::ControlsVisibility;
use super::scrub::ScrubCoordinator;
use super::stall::{RecoveryCheck, StallDetector};
use super::state::{PlaybackState, StateMachine};
use super::time_display::{TimeFormat, TimeSnapshot};
use super::RefreshInterval;
use crate::config::{TransportConfig, NORMAL_PLAYBACK_RATE, SEEK_RATE};
use crate::decoder::{DecoderEvent, DecoderEventSink, MediaDecoder, MediaSource};
use crate::error::DecoderError;
use crate::events::{ControlsSurface, EventListeners, ListenerId, TransportEvent};
use crate::timer::{TimerFire, TimerPurpose, TimerService};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Commands the UI can issue against the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Play,
    Pause,
    Stop,
    ScrubbingStarted,
    ScrubbedToTime(Duration),
    ScrubbingEnded,
    SetRate(f32),
    FastForwardPressed,
    RewindPressed,
    SeekButtonReleased,
    ResetVideo,
    ShowControls,
    HideControls,
    Tap,
}

/// Load status of the decoder's current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemStatus {
    Loading,
    Ready,
    Failed,
}

/// Builder for [`TransportController`].
///
/// Listeners and the controls surface registered here observe the
/// `Unknown -> Loading` transition performed by [`build`](Self::build).
pub struct TransportControllerBuilder {
    source: MediaSource,
    decoder: Box<dyn MediaDecoder>,
    config: TransportConfig,
    listeners: EventListeners,
    surface: Option<Weak<dyn ControlsSurface>>,
}

impl TransportControllerBuilder {
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn listener<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&TransportEvent) + Send + 'static,
    {
        self.listeners.subscribe(listener);
        self
    }

    pub fn controls_surface<S: ControlsSurface + 'static>(mut self, surface: &Arc<S>) -> Self {
        let weak: Weak<S> = Arc::downgrade(surface);
        let weak: Weak<dyn ControlsSurface> = weak;
        self.surface = Some(weak);
        self
    }

    /// Attaches the source to the decoder and enters `Loading`.
    pub fn build(self) -> TransportController {
        let refresh_interval = self.config.refresh_interval();
        let time_format = TimeFormat::new(refresh_interval, self.config.auto_decrement_remaining_time);

        let mut controller = TransportController {
            autoplay: self.config.autoplay,
            controls: ControlsVisibility::new(self.config.effective_display_duration()),
            source: self.source,
            decoder: self.decoder,
            config: self.config,
            refresh_interval,
            time_format,
            state: StateMachine::new(),
            timers: TimerService::new(),
            stall: StallDetector::new(),
            scrub: ScrubCoordinator::new(),
            listeners: self.listeners,
            surface: self.surface,
            item_status: ItemStatus::Loading,
            total_duration: Duration::ZERO,
            boundary_pending: false,
            shut_down: false,
        };

        controller.decoder.attach(&controller.source);
        controller.set_state(PlaybackState::Loading);

        if let Some(boundary) = controller.config.first_frame_boundary() {
            controller.decoder.add_boundary_observer(boundary);
            controller.boundary_pending = true;
        }

        log::debug!("Transport attached to {}", controller.source);
        controller
    }
}

/// Media transport controller.
pub struct TransportController {
    source: MediaSource,
    decoder: Box<dyn MediaDecoder>,
    config: TransportConfig,
    refresh_interval: RefreshInterval,
    time_format: TimeFormat,
    state: StateMachine,
    timers: TimerService,
    stall: StallDetector,
    scrub: ScrubCoordinator,
    controls: ControlsVisibility,
    listeners: EventListeners,
    surface: Option<Weak<dyn ControlsSurface>>,
    item_status: ItemStatus,
    total_duration: Duration,
    /// Set after a failed item is re-created, in addition to the configured autoplay.
    autoplay: bool,
    /// First-frame boundary registered and not crossed yet.
    boundary_pending: bool,
    shut_down: bool,
}

impl TransportController {
    /// Starts building a controller for `source` played by `decoder`.
    pub fn builder(source: MediaSource, decoder: Box<dyn MediaDecoder>) -> TransportControllerBuilder {
        TransportControllerBuilder {
            source,
            decoder,
            config: TransportConfig::default(),
            listeners: EventListeners::new(),
            surface: None,
        }
    }

    /// Creates a controller with `config` and no listeners.
    pub fn new(source: MediaSource, decoder: Box<dyn MediaDecoder>, config: TransportConfig) -> Self {
        Self::builder(source, decoder).config(config).build()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state.current()
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Total duration captured when the item became ready.
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        self.refresh_interval
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    pub fn controls_showing(&self) -> bool {
        self.controls.is_visible()
    }

    /// True while a scrub or fast-forward/rewind hold is in progress.
    pub fn is_seeking(&self) -> bool {
        self.controls.is_seek_in_progress()
    }

    /// True while the first-frame boundary has not been crossed.
    pub fn first_frame_pending(&self) -> bool {
        self.boundary_pending
    }

    pub fn is_stall_recovery_active(&self) -> bool {
        self.stall.is_recovering(&self.timers)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Current virtual time of the timer service.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Earliest pending timer deadline.
    pub fn next_timer_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Deadline of a specific timer, if pending.
    pub fn timer_deadline(&self, purpose: TimerPurpose) -> Option<Duration> {
        self.timers.deadline(purpose)
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&TransportEvent) + Send + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Sets the UI controls surface. Only a weak reference is kept.
    pub fn set_controls_surface<S: ControlsSurface + 'static>(&mut self, surface: &Arc<S>) {
        let weak: Weak<S> = Arc::downgrade(surface);
        let weak: Weak<dyn ControlsSurface> = weak;
        self.surface = Some(weak);
    }

    /// Routes decoder notifications to `sink`.
    pub fn connect_decoder_events(&mut self, sink: DecoderEventSink) {
        self.decoder.subscribe(sink);
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.config.autoplay = autoplay;
        self.autoplay = autoplay;
    }

    pub fn set_auto_decrement_remaining_time(&mut self, enabled: bool) {
        self.config.auto_decrement_remaining_time = enabled;
        self.time_format = TimeFormat::new(self.refresh_interval, enabled);
    }

    pub fn set_display_controls_on_tap(&mut self, enabled: bool) {
        self.config.display_controls_on_tap = enabled;
    }

    pub fn set_controls_display_duration(&mut self, secs: f64) {
        self.config.controls_display_duration_secs = secs;
        self.apply_display_duration();
    }

    pub fn set_dont_hide_controls(&mut self, enabled: bool) {
        self.config.dont_hide_controls = enabled;
        self.apply_display_duration();
    }

    /// Changes the time refresh interval. Non-positive values reset to the default.
    pub fn set_time_display_refresh_interval(&mut self, secs: f64) {
        self.refresh_interval = RefreshInterval::new(secs);
        self.config.time_display_refresh_interval_secs = self.refresh_interval.secs();
        self.time_format = TimeFormat::new(
            self.refresh_interval,
            self.config.auto_decrement_remaining_time,
        );

        if self.timers.is_scheduled(TimerPurpose::TimeRefresh) {
            self.timers
                .schedule_repeating(TimerPurpose::TimeRefresh, self.refresh_interval.as_duration());
        }
    }

    fn apply_display_duration(&mut self) {
        let duration = self.config.effective_display_duration();
        self.controls.set_display_duration(duration, &mut self.timers);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Dispatches a [`TransportCommand`].
    pub fn execute(&mut self, command: TransportCommand) {
        match command {
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::Stop => self.stop(),
            TransportCommand::ScrubbingStarted => self.scrubbing_started(),
            TransportCommand::ScrubbedToTime(target) => self.scrubbed_to_time(target),
            TransportCommand::ScrubbingEnded => self.scrubbing_ended(),
            TransportCommand::SetRate(rate) => self.set_rate(rate),
            TransportCommand::FastForwardPressed => self.fast_forward_pressed(),
            TransportCommand::RewindPressed => self.rewind_pressed(),
            TransportCommand::SeekButtonReleased => self.seek_button_released(),
            TransportCommand::ResetVideo => self.reset_video(),
            TransportCommand::ShowControls => self.show_controls(),
            TransportCommand::HideControls => self.hide_controls(),
            TransportCommand::Tap => self.handle_tap(),
        }
    }

    /// Starts or resumes playback.
    ///
    /// - Failed item: re-created from the same source, autoplay is
    ///   flagged and playback starts once the decoder is ready again
    /// - Still loading: ignored
    /// - Otherwise: plays at normal rate and enters `Playing` unless the
    ///   first-frame boundary is still pending
    pub fn play(&mut self) {
        if self.rejected_after_shutdown("play") {
            return;
        }

        match self.item_status {
            ItemStatus::Failed => {
                self.retry_failed_item();
                return;
            }
            ItemStatus::Loading => {
                log::debug!("Play requested before {} finished loading", self.source);
                return;
            }
            ItemStatus::Ready => {}
        }

        self.stall.cancel(&mut self.timers);
        self.decoder.play();
        self.decoder.set_rate(NORMAL_PLAYBACK_RATE);
        self.with_surface(|surface| surface.set_playing_indicator(true));

        self.apply_display_duration();
        self.controls.evaluate_auto_hide(&mut self.timers);

        self.enter_playing();
    }

    /// Pauses playback, remembering the current rate.
    pub fn pause(&mut self) {
        if self.rejected_after_shutdown("pause") {
            return;
        }

        self.stall.cancel(&mut self.timers);
        self.scrub.capture_rate(self.decoder.rate());
        self.decoder.pause();

        if self.item_status == ItemStatus::Ready {
            self.set_state(PlaybackState::ReadyToPlay);
        } else {
            self.sync_playing_indicator();
        }
    }

    /// Stops playback and returns to `Unknown`.
    pub fn stop(&mut self) {
        if self.rejected_after_shutdown("stop") {
            return;
        }

        self.stall.cancel(&mut self.timers);
        self.decoder.set_rate(0.0);
        self.complete_playback();
        self.set_state(PlaybackState::Unknown);
    }

    /// Begins a scrub interaction.
    pub fn scrubbing_started(&mut self) {
        if self.rejected_after_shutdown("scrub") {
            return;
        }

        self.controls.cancel_auto_hide(&mut self.timers);
        self.controls.set_seek_in_progress(true);
        self.stall.cancel(&mut self.timers);
        self.scrub.begin(self.decoder.rate());
        self.decoder.pause();
    }

    /// Requests a seek to `target` and shows it immediately.
    ///
    /// The seek reaches the decoder on the next [`flush_pending_seek`](Self::flush_pending_seek);
    /// a newer request made before then replaces this one.
    pub fn scrubbed_to_time(&mut self, target: Duration) {
        if self.rejected_after_shutdown("scrub") {
            return;
        }

        let target = self.clamp_to_duration(target);
        self.scrub.request_seek(target);
        self.publish_time(TimeSnapshot::new(target, self.total_duration));
    }

    /// Ends the scrub, resuming playback if it was playing before.
    ///
    /// Resumes only with enough media buffered at the new position;
    /// otherwise enters `Stalled` and starts stall recovery.
    pub fn scrubbing_ended(&mut self) {
        if self.rejected_after_shutdown("scrub") {
            return;
        }

        self.flush_pending_seek();
        self.controls.set_seek_in_progress(false);

        let snapshot = self.scrub.end();
        if snapshot.was_playing_forward() {
            if self.stall.has_playable_material(self.decoder.buffered_range()) {
                self.decoder.play();
                self.enter_playing();
            } else {
                log::debug!("Not enough media buffered after scrub; waiting");
                self.stall.start_recovery(&mut self.timers);
                self.set_state(PlaybackState::Stalled);
            }
        }

        self.controls.evaluate_auto_hide(&mut self.timers);
    }

    /// Applies the pending seek, if any, to the decoder.
    ///
    /// Returns true if a seek was issued.
    pub fn flush_pending_seek(&mut self) -> bool {
        match self.scrub.take_pending() {
            Some(request) => {
                self.decoder.cancel_pending_seeks();
                self.decoder.seek(request.target_position);
                log::trace!("Seek to {:?} applied", request.target_position);
                true
            }
            None => false,
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        if self.rejected_after_shutdown("rate change") {
            return;
        }
        self.decoder.set_rate(rate);
    }

    /// Fast-forward held: seek forward at the seek rate.
    pub fn fast_forward_pressed(&mut self) {
        self.seek_button_pressed(SEEK_RATE);
    }

    /// Rewind held: seek backward at the seek rate.
    pub fn rewind_pressed(&mut self) {
        self.seek_button_pressed(-SEEK_RATE);
    }

    fn seek_button_pressed(&mut self, rate: f32) {
        if self.rejected_after_shutdown("seek button") {
            return;
        }
        self.controls.set_seek_in_progress(true);
        self.decoder.set_rate(rate);
    }

    /// Fast-forward or rewind released: resume normal playback.
    pub fn seek_button_released(&mut self) {
        if self.rejected_after_shutdown("seek button") {
            return;
        }
        self.controls.set_seek_in_progress(false);
        self.play();
        self.controls.evaluate_auto_hide(&mut self.timers);
    }

    /// Seeks back to the start without changing the playback state.
    pub fn reset_video(&mut self) {
        if self.rejected_after_shutdown("reset") {
            return;
        }
        self.scrub.take_pending();
        self.decoder.seek(Duration::ZERO);
    }

    pub fn show_controls(&mut self) {
        if self.rejected_after_shutdown("controls change") {
            return;
        }
        if self.controls.show(&mut self.timers) {
            self.emit(TransportEvent::ControlsVisibilityChanged { visible: true });
        }
    }

    pub fn hide_controls(&mut self) {
        if self.rejected_after_shutdown("controls change") {
            return;
        }
        if self.controls.hide(&mut self.timers) {
            self.emit(TransportEvent::ControlsVisibilityChanged { visible: false });
        }
    }

    pub fn set_controls_visible(&mut self, visible: bool) {
        if visible {
            self.show_controls();
        } else {
            self.hide_controls();
        }
    }

    /// Tap on the video surface; shows the controls when configured to.
    pub fn handle_tap(&mut self) {
        if self.rejected_after_shutdown("tap") {
            return;
        }
        if self.config.display_controls_on_tap {
            self.show_controls();
        }
    }

    // =========================================================================
    // Decoder events
    // =========================================================================

    pub fn handle_decoder_event(&mut self, event: DecoderEvent) {
        if self.shut_down {
            log::debug!("Dropping decoder event after shutdown: {:?}", event);
            return;
        }

        match event {
            DecoderEvent::StatusReady { duration } => self.on_item_ready(duration),
            DecoderEvent::StatusFailed(error) => self.on_item_failed(error),
            DecoderEvent::Stalled => self.on_stalled(),
            DecoderEvent::ReachedEnd => self.on_reached_end(),
            DecoderEvent::BoundaryCrossed => self.on_boundary_crossed(),
        }
    }

    fn on_item_ready(&mut self, duration: Duration) {
        self.item_status = ItemStatus::Ready;
        self.total_duration = duration;

        self.timers
            .schedule_repeating(TimerPurpose::TimeRefresh, self.refresh_interval.as_duration());
        self.set_state(PlaybackState::ReadyToPlay);
        self.publish_time(TimeSnapshot::new(Duration::ZERO, duration));

        if self.autoplay {
            self.play();
            self.controls.evaluate_auto_hide(&mut self.timers);
        }
    }

    fn on_item_failed(&mut self, error: DecoderError) {
        log::warn!("Media item {} failed: {}", self.source, error);
        self.item_status = ItemStatus::Failed;
        self.stall.cancel(&mut self.timers);
        self.timers.cancel(TimerPurpose::TimeRefresh);
        self.set_state(PlaybackState::Failed);
        self.emit(TransportEvent::LoadFailed(error));
    }

    fn on_stalled(&mut self) {
        let state = self.state.current();
        let running = state == PlaybackState::Playing
            || (state == PlaybackState::ReadyToPlay && self.decoder.rate() > 0.0);
        if !running {
            log::debug!("Ignoring stall while {}", state);
            return;
        }

        log::info!("Playback of {} stalled", self.source);
        self.set_state(PlaybackState::Stalled);
        self.stall.start_recovery(&mut self.timers);
    }

    fn on_reached_end(&mut self) {
        // A slow network can leave the recovery loop running past the end.
        self.stall.cancel(&mut self.timers);
        self.scrub.take_pending();
        self.decoder.pause();
        self.decoder.seek(Duration::ZERO);
        self.set_state(PlaybackState::ReadyToPlay);
        self.complete_playback();
    }

    fn on_boundary_crossed(&mut self) {
        if !self.boundary_pending {
            return;
        }
        self.boundary_pending = false;
        self.emit(TransportEvent::FirstFrameRendered);

        // A stall recovered while the boundary was pending left the state at
        // `Stalled` with the decoder already playing.
        let state = self.state.current();
        let resumable = state == PlaybackState::ReadyToPlay
            || (state == PlaybackState::Stalled && !self.stall.is_recovering(&self.timers));
        if resumable && self.decoder.rate() > 0.0 {
            self.set_state(PlaybackState::Playing);
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Advances the virtual clock to `now`, firing every timer due on the way.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some(fire) = self.timers.pop_due(now) {
            self.on_timer(fire);
        }
        self.timers.advance_clock(now);
    }

    /// Advances the virtual clock by `delta`.
    pub fn advance_by(&mut self, delta: Duration) {
        let target = self.timers.now().saturating_add(delta);
        self.advance_to(target);
    }

    fn on_timer(&mut self, fire: TimerFire) {
        match fire.purpose {
            TimerPurpose::TimeRefresh => {
                let snapshot = TimeSnapshot::new(self.decoder.position(), self.total_duration);
                self.publish_time(snapshot);
            }
            TimerPurpose::StallRecovery => {
                let range = self.decoder.buffered_range();
                if self.stall.check(range, &mut self.timers) == RecoveryCheck::Recovered {
                    self.play();
                }
            }
            TimerPurpose::ControlsAutoHide => self.hide_controls(),
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Cancels every timer and detaches from the decoder.
    ///
    /// Runs before the decoder handle is released; later commands and
    /// decoder events are ignored. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.timers.cancel_all();
        self.decoder.unsubscribe();
        self.decoder.remove_boundary_observer();
        self.boundary_pending = false;
        self.decoder.pause();
        self.listeners.clear();

        log::debug!("Transport for {} shut down", self.source);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn retry_failed_item(&mut self) {
        log::info!("Re-creating failed item for {}", self.source);
        self.decoder.replace_item(&self.source);
        self.item_status = ItemStatus::Loading;
        self.autoplay = true;
        self.set_state(PlaybackState::Loading);
    }

    fn enter_playing(&mut self) {
        if self.boundary_pending {
            log::debug!("Waiting for the first frame before reporting playback");
            return;
        }
        self.set_state(PlaybackState::Playing);
    }

    fn set_state(&mut self, next: PlaybackState) {
        let write = self.state.set(next);
        self.sync_playing_indicator();
        if write.changed {
            self.emit(TransportEvent::StateChanged {
                previous: write.previous,
                current: write.current,
            });
        }
    }

    fn sync_playing_indicator(&self) {
        let playing = self.state.current().is_playing();
        self.with_surface(|surface| surface.set_playing_indicator(playing));
    }

    fn complete_playback(&mut self) {
        self.with_surface(|surface| surface.playback_complete());
        self.emit(TransportEvent::PlaybackComplete);
    }

    fn publish_time(&mut self, snapshot: TimeSnapshot) {
        let labels = snapshot.labels(&self.time_format);
        self.with_surface(|surface| surface.show_time(&snapshot, &labels));
        self.emit(TransportEvent::TimeUpdated(snapshot));
    }

    fn emit(&mut self, event: TransportEvent) {
        self.listeners.emit(&event);
    }

    fn with_surface(&self, f: impl FnOnce(&dyn ControlsSurface)) {
        if let Some(surface) = self.surface.as_ref().and_then(Weak::upgrade) {
            f(surface.as_ref());
        }
    }

    fn clamp_to_duration(&self, target: Duration) -> Duration {
        if self.total_duration.is_zero() {
            target
        } else {
            target.min(self.total_duration)
        }
    }

    fn rejected_after_shutdown(&self, command: &str) -> bool {
        if self.shut_down {
            log::debug!("Ignoring {} after shutdown", command);
        }
        self.shut_down
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for TransportController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportController")
            .field("source", &self.source)
            .field("state", &self.state.current())
            .field("item_status", &self.item_status)
            .field("total_duration", &self.total_duration)
            .field("controls_visible", &self.controls.is_visible())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::BufferedRange;
    use crate::testing::{DecoderCall, DecoderProbe, EventLog, RecordingSurface, ScriptedDecoder};

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    fn config_without_boundary() -> TransportConfig {
        TransportConfig {
            first_frame_boundary_secs: 0.0,
            ..TransportConfig::default()
        }
    }

    fn controller_with(config: TransportConfig) -> (TransportController, DecoderProbe, EventLog) {
        let (decoder, probe) = ScriptedDecoder::new();
        let log = EventLog::new();
        let controller = TransportController::builder(MediaSource::new("movie.mp4"), Box::new(decoder))
            .config(config)
            .listener(log.listener())
            .build();
        (controller, probe, log)
    }

    fn ready_controller() -> (TransportController, DecoderProbe, EventLog) {
        let (mut controller, probe, log) = controller_with(config_without_boundary());
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(120.0),
        });
        (controller, probe, log)
    }

    #[test]
    fn construction_attaches_source_and_enters_loading() {
        let (controller, probe, log) = controller_with(TransportConfig::default());

        assert_eq!(controller.state(), PlaybackState::Loading);
        assert_eq!(
            probe.calls()[..2],
            [
                DecoderCall::Attach("movie.mp4".into()),
                DecoderCall::AddBoundaryObserver(secs(0.1)),
            ]
        );
        assert_eq!(
            log.states(),
            vec![(PlaybackState::Unknown, PlaybackState::Loading)]
        );
        assert!(controller.first_frame_pending());
    }

    #[test]
    fn ready_captures_duration_and_starts_refresh() {
        let (controller, _probe, log) = ready_controller();

        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
        assert_eq!(controller.total_duration(), secs(120.0));
        assert_eq!(
            controller.timer_deadline(TimerPurpose::TimeRefresh),
            Some(secs(1.0))
        );
        assert_eq!(
            log.time_updates(),
            vec![TimeSnapshot::new(Duration::ZERO, secs(120.0))]
        );
    }

    #[test]
    fn play_while_loading_is_ignored() {
        let (mut controller, probe, _log) = controller_with(config_without_boundary());
        probe.clear_calls();

        controller.play();

        assert_eq!(controller.state(), PlaybackState::Loading);
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn play_enters_playing_at_normal_rate() {
        let (mut controller, probe, _log) = ready_controller();

        controller.play();

        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(probe.rate(), 1.0);
    }

    #[test]
    fn play_waits_for_first_frame_boundary() {
        let (mut controller, _probe, log) = controller_with(TransportConfig::default());
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(10.0),
        });

        controller.play();
        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);

        controller.handle_decoder_event(DecoderEvent::BoundaryCrossed);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(!controller.first_frame_pending());
        assert_eq!(log.count(|event| *event == TransportEvent::FirstFrameRendered), 1);

        // One-shot: a second crossing is ignored.
        controller.handle_decoder_event(DecoderEvent::BoundaryCrossed);
        assert_eq!(log.count(|event| *event == TransportEvent::FirstFrameRendered), 1);
    }

    #[test]
    fn pause_captures_rate_and_returns_to_ready() {
        let (mut controller, probe, _log) = ready_controller();
        controller.play();

        controller.pause();

        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
        assert_eq!(probe.rate(), 0.0);
    }

    #[test]
    fn stop_zeroes_rate_and_enters_unknown() {
        let (mut controller, probe, log) = ready_controller();
        controller.play();

        controller.stop();

        assert_eq!(controller.state(), PlaybackState::Unknown);
        assert_eq!(probe.rate(), 0.0);
        assert_eq!(log.count(|event| *event == TransportEvent::PlaybackComplete), 1);
    }

    #[test]
    fn load_failure_reports_and_retries_on_play() {
        let (mut controller, probe, log) = controller_with(config_without_boundary());
        let error = DecoderError::Network("offline".into());

        controller.handle_decoder_event(DecoderEvent::StatusFailed(error.clone()));
        assert_eq!(controller.state(), PlaybackState::Failed);
        assert_eq!(log.count(|event| *event == TransportEvent::LoadFailed(error.clone())), 1);

        controller.play();
        assert_eq!(controller.state(), PlaybackState::Loading);
        assert!(probe
            .calls()
            .contains(&DecoderCall::ReplaceItem("movie.mp4".into())));

        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(60.0),
        });
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn stall_recovers_once_buffer_exceeds_threshold() {
        let (mut controller, probe, _log) = ready_controller();
        controller.play();

        controller.handle_decoder_event(DecoderEvent::Stalled);
        assert_eq!(controller.state(), PlaybackState::Stalled);

        probe.set_buffered(Some(BufferedRange::new(Duration::ZERO, secs(0.5))));
        controller.advance_by(secs(2.0));
        assert_eq!(controller.state(), PlaybackState::Stalled);

        probe.set_buffered(Some(BufferedRange::new(Duration::ZERO, secs(1.5))));
        controller.advance_by(secs(2.0));
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(!controller.is_stall_recovery_active());
    }

    #[test]
    fn stall_before_first_frame_resumes_on_boundary() {
        let (mut controller, probe, log) = controller_with(TransportConfig::default());
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(120.0),
        });
        controller.play();
        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);

        controller.handle_decoder_event(DecoderEvent::Stalled);
        assert_eq!(controller.state(), PlaybackState::Stalled);

        probe.set_buffered(Some(BufferedRange::new(Duration::ZERO, secs(5.0))));
        controller.advance_by(secs(2.0));
        assert_eq!(controller.state(), PlaybackState::Stalled);
        assert!(!controller.is_stall_recovery_active());
        assert_eq!(probe.rate(), 1.0);

        controller.handle_decoder_event(DecoderEvent::BoundaryCrossed);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(!controller.first_frame_pending());
        assert_eq!(
            log.states().last(),
            Some(&(PlaybackState::Stalled, PlaybackState::Playing))
        );
    }

    #[test]
    fn boundary_during_stall_recovery_waits_for_buffer() {
        let (mut controller, probe, _log) = controller_with(TransportConfig::default());
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(120.0),
        });
        controller.play();
        controller.handle_decoder_event(DecoderEvent::Stalled);

        controller.handle_decoder_event(DecoderEvent::BoundaryCrossed);
        assert_eq!(controller.state(), PlaybackState::Stalled);
        assert!(controller.is_stall_recovery_active());

        probe.set_buffered(Some(BufferedRange::new(Duration::ZERO, secs(5.0))));
        controller.advance_by(secs(2.0));
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(!controller.is_stall_recovery_active());
    }

    #[test]
    fn scrub_end_stall_before_first_frame_resumes_on_boundary() {
        let (mut controller, probe, _log) = controller_with(TransportConfig::default());
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(120.0),
        });
        controller.play();

        controller.scrubbing_started();
        controller.scrubbed_to_time(secs(30.0));
        controller.scrubbing_ended();
        assert_eq!(controller.state(), PlaybackState::Stalled);
        assert!(controller.is_stall_recovery_active());

        probe.set_buffered(Some(BufferedRange::new(secs(30.0), secs(5.0))));
        controller.advance_by(secs(2.0));
        assert_eq!(controller.state(), PlaybackState::Stalled);
        assert_eq!(probe.rate(), 1.0);

        controller.handle_decoder_event(DecoderEvent::BoundaryCrossed);
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn boundary_does_not_resume_a_paused_stall() {
        let (mut controller, probe, _log) = controller_with(TransportConfig::default());
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(120.0),
        });
        controller.play();
        controller.handle_decoder_event(DecoderEvent::Stalled);
        controller.pause();
        assert_eq!(probe.rate(), 0.0);

        controller.handle_decoder_event(DecoderEvent::BoundaryCrossed);
        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
    }

    #[test]
    fn stall_is_ignored_when_not_playing() {
        let (mut controller, _probe, _log) = ready_controller();

        controller.handle_decoder_event(DecoderEvent::Stalled);

        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
        assert!(!controller.is_stall_recovery_active());
    }

    #[test]
    fn reaching_end_seeks_to_start_and_cancels_recovery() {
        let (mut controller, probe, _log) = ready_controller();
        controller.play();
        controller.handle_decoder_event(DecoderEvent::Stalled);
        probe.clear_calls();

        controller.handle_decoder_event(DecoderEvent::ReachedEnd);

        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
        assert!(!controller.is_stall_recovery_active());
        assert!(probe.calls().contains(&DecoderCall::Seek(Duration::ZERO)));
    }

    #[test]
    fn scrub_applies_only_latest_seek() {
        let (mut controller, probe, log) = ready_controller();
        controller.play();
        probe.set_buffered(Some(BufferedRange::new(secs(45.0), secs(5.0))));
        probe.clear_calls();

        controller.scrubbing_started();
        controller.scrubbed_to_time(secs(30.0));
        controller.scrubbed_to_time(secs(45.0));
        controller.scrubbing_ended();

        assert_eq!(probe.seeks(), vec![secs(45.0)]);
        assert_eq!(controller.state(), PlaybackState::Playing);
        let optimistic: Vec<_> = log.time_updates().iter().map(|t| t.position).collect();
        assert!(optimistic.ends_with(&[secs(30.0), secs(45.0)]));
    }

    #[test]
    fn scrub_end_without_buffer_stalls() {
        let (mut controller, probe, _log) = ready_controller();
        controller.play();
        probe.set_buffered(None);

        controller.scrubbing_started();
        controller.scrubbed_to_time(secs(80.0));
        controller.scrubbing_ended();

        assert_eq!(controller.state(), PlaybackState::Stalled);
        assert!(controller.is_stall_recovery_active());
    }

    #[test]
    fn scrub_from_pause_stays_paused() {
        let (mut controller, probe, _log) = ready_controller();

        controller.scrubbing_started();
        controller.scrubbed_to_time(secs(10.0));
        controller.scrubbing_ended();

        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
        assert_eq!(probe.rate(), 0.0);
    }

    #[test]
    fn scrub_target_is_clamped_to_duration() {
        let (mut controller, probe, _log) = ready_controller();

        controller.scrubbing_started();
        controller.scrubbed_to_time(secs(500.0));
        controller.scrubbing_ended();

        assert_eq!(probe.seeks(), vec![secs(120.0)]);
    }

    #[test]
    fn seek_buttons_use_seek_rate_and_resume() {
        let (mut controller, probe, _log) = ready_controller();
        controller.play();

        controller.fast_forward_pressed();
        assert!(controller.is_seeking());
        assert_eq!(probe.rate(), 3.0);

        controller.seek_button_released();
        assert!(!controller.is_seeking());
        assert_eq!(probe.rate(), 1.0);

        controller.rewind_pressed();
        assert_eq!(probe.rate(), -3.0);
    }

    #[test]
    fn controls_auto_hide_after_play() {
        let config = TransportConfig {
            controls_display_duration_secs: 3.0,
            ..config_without_boundary()
        };
        let (mut controller, _probe, log) = controller_with(config);
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(60.0),
        });
        controller.play();

        controller.advance_by(secs(3.0));

        assert!(!controller.controls_showing());
        assert_eq!(log.visibility_changes(), vec![false]);
    }

    #[test]
    fn tap_shows_controls_only_when_enabled() {
        let (mut controller, _probe, log) = ready_controller();
        controller.hide_controls();

        controller.handle_tap();
        assert!(!controller.controls_showing());

        controller.set_display_controls_on_tap(true);
        controller.handle_tap();
        assert!(controller.controls_showing());
        assert_eq!(log.visibility_changes(), vec![false, true]);
    }

    #[test]
    fn surface_tracks_playing_indicator() {
        let surface = Arc::new(RecordingSurface::default());
        let (decoder, _probe) = ScriptedDecoder::new();
        let mut controller = TransportController::builder(MediaSource::new("clip.mov"), Box::new(decoder))
            .config(config_without_boundary())
            .controls_surface(&surface)
            .build();
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(30.0),
        });

        controller.play();
        assert_eq!(surface.playing_indicator(), Some(true));

        controller.pause();
        assert_eq!(surface.playing_indicator(), Some(false));
        assert_eq!(surface.last_labels().map(|labels| labels.remaining), Some("00:30".to_string()));
    }

    #[test]
    fn dropped_surface_is_not_kept_alive() {
        let surface = Arc::new(RecordingSurface::default());
        let (decoder, _probe) = ScriptedDecoder::new();
        let mut controller = TransportController::builder(MediaSource::new("clip.mov"), Box::new(decoder))
            .controls_surface(&surface)
            .build();

        drop(surface);
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(30.0),
        });
        assert_eq!(controller.state(), PlaybackState::ReadyToPlay);
    }

    #[test]
    fn refresh_interval_change_reschedules_tick() {
        let (mut controller, _probe, _log) = ready_controller();

        controller.set_time_display_refresh_interval(0.5);
        assert_eq!(
            controller.timer_deadline(TimerPurpose::TimeRefresh),
            Some(secs(0.5))
        );

        controller.set_time_display_refresh_interval(-1.0);
        assert_eq!(controller.refresh_interval(), RefreshInterval::default());
    }

    #[test]
    fn shutdown_cancels_timers_and_detaches_decoder() {
        let (mut controller, probe, _log) = ready_controller();
        controller.play();
        controller.handle_decoder_event(DecoderEvent::Stalled);

        controller.shutdown();

        assert_eq!(controller.next_timer_deadline(), None);
        let calls = probe.calls();
        let unsubscribe = calls.iter().position(|call| *call == DecoderCall::Unsubscribe);
        assert!(unsubscribe.is_some());
        assert!(calls.contains(&DecoderCall::RemoveBoundaryObserver));

        controller.play();
        assert_eq!(controller.state(), PlaybackState::Stalled);
    }

    #[test]
    fn controls_commands_are_ignored_after_shutdown() {
        let (mut controller, _probe, log) = controller_with(TransportConfig {
            controls_display_duration_secs: 3.0,
            ..config_without_boundary()
        });
        controller.hide_controls();
        controller.shutdown();
        log.clear();

        controller.show_controls();
        controller.set_controls_visible(true);
        controller.handle_tap();

        assert!(!controller.controls_showing());
        assert_eq!(controller.next_timer_deadline(), None);
        assert!(log.visibility_changes().is_empty());

        controller.advance_by(secs(10.0));
        assert!(log.events().is_empty());
    }

    #[test]
    fn oversized_durations_do_not_overflow_timers() {
        let (mut controller, _probe, _log) = controller_with(TransportConfig {
            controls_display_duration_secs: 1e20,
            time_display_refresh_interval_secs: 1e20,
            ..config_without_boundary()
        });
        controller.handle_decoder_event(DecoderEvent::StatusReady {
            duration: secs(120.0),
        });
        controller.advance_by(secs(5.0));
        controller.play();

        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(
            controller.timer_deadline(TimerPurpose::TimeRefresh),
            Some(Duration::MAX)
        );
        controller.advance_by(secs(60.0));
        assert!(controller.controls_showing());
    }

    #[test]
    fn drop_runs_shutdown_before_releasing_decoder() {
        let (controller, probe, _log) = ready_controller();
        drop(controller);

        let calls = probe.calls();
        let unsubscribe = calls.iter().position(|call| *call == DecoderCall::Unsubscribe);
        let released = calls.iter().position(|call| *call == DecoderCall::Released);
        assert!(unsubscribe.is_some());
        assert!(unsubscribe < released);
    }
}
