// SPDX-License-Identifier: MPL-2.0
//! Async driver for a [`TransportController`].
//!
//! The controller is moved into a tokio task that serializes UI commands,
//! decoder notifications and timer deadlines onto one context. The task's
//! virtual clock follows `tokio::time`, so tests can run it with paused time.
//!
//! Commands queued while the task was busy are applied as one batch; a
//! pending seek is flushed to the decoder only after the batch, so a scrub
//! that outpaces the decoder only ever issues the latest target.

use crate::decoder::{DecoderEvent, DecoderEventSink};
use crate::error::{Error, Result};
use crate::events::TransportEvent;
use crate::transport::{PlaybackState, TransportCommand, TransportController};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

type ConfigureFn = Box<dyn FnOnce(&mut TransportController) + Send>;

enum Input {
    Command(TransportCommand),
    Configure(ConfigureFn),
    Status(oneshot::Sender<TransportStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Point-in-time view of the controller running in the task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportStatus {
    pub state: PlaybackState,
    pub controls_visible: bool,
    pub seeking: bool,
    pub total_duration: Duration,
}

impl TransportStatus {
    fn of(controller: &TransportController) -> Self {
        Self {
            state: controller.state(),
            controls_visible: controller.controls_showing(),
            seeking: controller.is_seeking(),
            total_duration: controller.total_duration(),
        }
    }
}

/// Cloneable handle for sending commands to a running transport.
///
/// Every method fails with [`Error::TransportClosed`] once the task ended.
#[derive(Clone)]
pub struct TransportHandle {
    inputs: mpsc::UnboundedSender<Input>,
}

impl TransportHandle {
    /// Queues a command.
    pub fn send(&self, command: TransportCommand) -> Result<()> {
        self.push(Input::Command(command))
    }

    pub fn play(&self) -> Result<()> {
        self.send(TransportCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(TransportCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(TransportCommand::Stop)
    }

    /// Scrubs to `target` as part of an ongoing scrub interaction.
    pub fn scrub_to(&self, target: Duration) -> Result<()> {
        self.send(TransportCommand::ScrubbedToTime(target))
    }

    /// Runs `update` against the controller on its own context.
    ///
    /// Used for settings changes, e.g. `handle.configure(|c| c.set_autoplay(true))`.
    pub fn configure<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut TransportController) + Send + 'static,
    {
        self.push(Input::Configure(Box::new(update)))
    }

    /// Returns the controller status once queued commands are applied.
    pub async fn status(&self) -> Result<TransportStatus> {
        let (reply, response) = oneshot::channel();
        self.push(Input::Status(reply))?;
        response.await.map_err(|_| Error::TransportClosed)
    }

    /// Shuts the transport down and waits for teardown to finish.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.push(Input::Shutdown(ack))?;
        done.await.map_err(|_| Error::TransportClosed)
    }

    /// Returns true once the task no longer accepts commands.
    pub fn is_closed(&self) -> bool {
        self.inputs.is_closed()
    }

    fn push(&self, input: Input) -> Result<()> {
        self.inputs.send(input).map_err(|_| Error::TransportClosed)
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandle")
            .field("closed", &self.inputs.is_closed())
            .finish()
    }
}

/// Spawned transport: the command handle, the event stream and the task.
#[derive(Debug)]
pub struct RunningTransport {
    pub handle: TransportHandle,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
    pub task: JoinHandle<()>,
}

/// Moves `controller` into a new tokio task and wires the decoder to it.
///
/// The task ends after [`TransportHandle::shutdown`], or when every handle
/// has been dropped; either way the controller is shut down first.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn spawn(mut controller: TransportController) -> RunningTransport {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (sink, decoder_rx) = DecoderEventSink::channel();

    controller.connect_decoder_events(sink);
    controller.subscribe(move |event: &TransportEvent| {
        // The receiver may be gone; the transport keeps running regardless.
        let _ = event_tx.send(event.clone());
    });

    let task = tokio::spawn(run(controller, input_rx, decoder_rx));

    RunningTransport {
        handle: TransportHandle { inputs: input_tx },
        events: event_rx,
        task,
    }
}

/// Maps tokio time onto the controller's virtual clock.
struct Clock {
    origin: Instant,
    base: Duration,
}

impl Clock {
    fn start(controller: &TransportController) -> Self {
        Self {
            origin: Instant::now(),
            base: controller.now(),
        }
    }

    fn now(&self) -> Duration {
        self.base.saturating_add(self.origin.elapsed())
    }

    /// `None` when the deadline lies beyond what tokio can represent.
    fn instant_for(&self, virtual_time: Duration) -> Option<Instant> {
        self.origin.checked_add(virtual_time.saturating_sub(self.base))
    }
}

enum Wake {
    Input(Option<Input>),
    Decoder(DecoderEvent),
    Timer,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

async fn run(
    mut controller: TransportController,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    mut decoder_events: mpsc::UnboundedReceiver<DecoderEvent>,
) {
    let clock = Clock::start(&controller);
    log::debug!("Transport task started for {}", controller.source());

    loop {
        let deadline = controller
            .next_timer_deadline()
            .and_then(|due| clock.instant_for(due));

        let wake = tokio::select! {
            input = inputs.recv() => Wake::Input(input),
            Some(event) = decoder_events.recv() => Wake::Decoder(event),
            () = sleep_until(deadline) => Wake::Timer,
        };

        controller.advance_to(clock.now());

        match wake {
            Wake::Input(Some(input)) => {
                let mut shutdown = apply(&mut controller, input);
                while shutdown.is_none() {
                    match inputs.try_recv() {
                        Ok(input) => shutdown = apply(&mut controller, input),
                        Err(_) => break,
                    }
                }
                controller.flush_pending_seek();

                if let Some(ack) = shutdown {
                    controller.shutdown();
                    let _ = ack.send(());
                    log::debug!("Transport task stopped on request");
                    return;
                }
            }
            Wake::Input(None) => break,
            Wake::Decoder(event) => controller.handle_decoder_event(event),
            Wake::Timer => {}
        }
    }

    controller.shutdown();
    log::debug!("Transport task stopped: all handles dropped");
}

/// Applies one input. Returns the acknowledgement sender for a shutdown request.
fn apply(controller: &mut TransportController, input: Input) -> Option<oneshot::Sender<()>> {
    match input {
        Input::Command(command) => {
            log::trace!("Transport command {:?}", command);
            controller.execute(command);
            None
        }
        Input::Configure(update) => {
            update(controller);
            None
        }
        Input::Status(reply) => {
            let _ = reply.send(TransportStatus::of(controller));
            None
        }
        Input::Shutdown(ack) => Some(ack),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::decoder::MediaSource;
    use crate::testing::{DecoderCall, ScriptedDecoder};

    #[tokio::test(start_paused = true)]
    async fn handle_reports_closed_after_shutdown() {
        let (decoder, probe) = ScriptedDecoder::new();
        let controller = TransportController::new(
            MediaSource::new("clip.mp4"),
            Box::new(decoder),
            TransportConfig::default(),
        );
        let running = spawn(controller);
        assert!(probe.is_subscribed());

        running.handle.shutdown().await.unwrap();
        running.task.await.unwrap();

        assert!(!probe.is_subscribed());
        assert!(probe.calls().contains(&DecoderCall::Released));
        assert!(matches!(running.handle.play(), Err(Error::TransportClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_stops_the_task() {
        let (decoder, probe) = ScriptedDecoder::new();
        let controller = TransportController::new(
            MediaSource::new("clip.mp4"),
            Box::new(decoder),
            TransportConfig::default(),
        );
        let RunningTransport { handle, task, .. } = spawn(controller);

        drop(handle);
        task.await.unwrap();

        assert!(probe.calls().contains(&DecoderCall::Unsubscribe));
    }
}
