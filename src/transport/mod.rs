// SPDX-License-Identifier: MPL-2.0
//! Transport control: playback state, stall recovery, scrubbing, controls
//! visibility and the command facade tying them together.

pub mod controller;
pub mod controls;
pub mod refresh_interval;
pub mod scrub;
pub mod stall;
pub mod state;
pub mod time_display;

pub use controller::{TransportCommand, TransportController, TransportControllerBuilder};
pub use controls::ControlsVisibility;
pub use refresh_interval::RefreshInterval;
pub use scrub::{PlaybackRateSnapshot, ScrubCoordinator, SeekRequest};
pub use stall::{RecoveryCheck, StallDetector};
pub use state::{PlaybackState, StateMachine, StateWrite};
pub use time_display::{format_time, TimeFormat, TimeLabels, TimeSnapshot};
