// SPDX-License-Identifier: MPL-2.0
//! Demo driving a transport against a simulated decoder.
//!
//! ```text
//! video_transport [--config PATH] [--duration SECS] [--stall-at SECS] [--fail] [--autoplay] [SOURCE]
//! ```

use std::path::PathBuf;
use std::time::Duration;
use video_transport::config::{self, TransportConfig};
use video_transport::decoder::{BufferedRange, DecoderEvent, MediaSource};
use video_transport::error::{DecoderError, Error, Result};
use video_transport::runtime;
use video_transport::testing::{DecoderProbe, ScriptedDecoder};
use video_transport::transport::TransportController;

const TICK: Duration = Duration::from_millis(100);
const STALL_LENGTH: Duration = Duration::from_secs(3);
const BUFFER_AHEAD: Duration = Duration::from_secs(5);

struct Args {
    config: Option<PathBuf>,
    duration: Duration,
    stall_at: Option<Duration>,
    fail_first: bool,
    autoplay: bool,
    source: String,
}

fn parse_args() -> Result<Args> {
    let mut args = pico_args::Arguments::from_env();
    let invalid = |err: pico_args::Error| Error::Config(err.to_string());

    let config = args.opt_value_from_str("--config").map_err(invalid)?;
    let duration: f64 = args
        .opt_value_from_str("--duration")
        .map_err(invalid)?
        .unwrap_or(5.0);
    let stall_at: Option<f64> = args.opt_value_from_str("--stall-at").map_err(invalid)?;
    let fail_first = args.contains("--fail");
    let autoplay = args.contains("--autoplay");
    let source = args
        .finish()
        .into_iter()
        .next()
        .and_then(|s| s.into_string().ok())
        .unwrap_or_else(|| "demo.mp4".to_string());

    Ok(Args {
        config,
        duration: secs_arg(duration.max(0.5)),
        stall_at: stall_at.map(|secs| secs_arg(secs.max(0.0))),
        fail_first,
        autoplay,
        source,
    })
}

fn secs_arg(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn load_config(args: &Args) -> Result<TransportConfig> {
    let mut config = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };
    if args.autoplay {
        config.autoplay = true;
    }
    Ok(config)
}

/// Simulated playhead: advances while the decoder plays and the buffer holds.
async fn simulate_playback(probe: &DecoderProbe, args: &Args) {
    let mut interval = tokio::time::interval(TICK);
    let mut stall_pending = args.stall_at;
    let mut stalled_for: Option<Duration> = None;

    loop {
        interval.tick().await;

        if let Some(elapsed) = stalled_for.as_mut() {
            *elapsed += TICK;
            if *elapsed >= STALL_LENGTH {
                log::info!("Network caught up");
                stalled_for = None;
            } else {
                continue;
            }
        }

        let rate = probe.rate();
        if rate <= 0.0 {
            continue;
        }

        let position = probe
            .position()
            .saturating_add(TICK.mul_f32(rate))
            .min(args.duration);
        probe.set_position(position);
        probe.set_buffered(Some(BufferedRange::new(position, BUFFER_AHEAD)));
        probe.cross_boundary();

        if stall_pending.is_some_and(|at| position >= at) {
            stall_pending = None;
            stalled_for = Some(Duration::ZERO);
            probe.set_buffered(Some(BufferedRange::new(position, Duration::ZERO)));
            probe.emit(DecoderEvent::Stalled);
            continue;
        }

        if position >= args.duration {
            probe.emit(DecoderEvent::ReachedEnd);
            return;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;
    let config = load_config(&args)?;
    let autoplay = config.autoplay;

    let (decoder, probe) = ScriptedDecoder::new();
    let controller =
        TransportController::new(MediaSource::new(args.source.clone()), Box::new(decoder), config);
    let runtime::RunningTransport {
        handle,
        mut events,
        task,
    } = runtime::spawn(controller);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log::info!("{:?}", event);
        }
    });

    if args.fail_first {
        probe.emit(DecoderEvent::StatusFailed(DecoderError::Network(
            "connection reset".to_string(),
        )));
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.play()?;
        tokio::time::sleep(TICK).await;
    }

    probe.emit(DecoderEvent::StatusReady {
        duration: args.duration,
    });
    if !autoplay && !args.fail_first {
        handle.play()?;
    }

    simulate_playback(&probe, &args).await;
    tokio::time::sleep(TICK).await;

    let status = handle.status().await?;
    log::info!("Finished in state {}", status.state);

    handle.shutdown().await?;
    let _ = task.await;
    let _ = printer.await;
    Ok(())
}
