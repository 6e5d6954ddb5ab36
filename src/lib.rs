// SPDX-License-Identifier: MPL-2.0
//! `video_transport` is a UI-agnostic media transport controller.
//!
//! It sits between a video decoder and whatever draws the playback controls:
//! it tracks the playback state, recovers from buffering stalls, coordinates
//! scrubbing so the decoder only sees the latest seek, and decides when the
//! controls overlay auto-hides.
//!
//! The [`transport::TransportController`] is a plain single-owner struct
//! driven by commands, [`decoder::DecoderEvent`]s and a virtual clock. The
//! [`runtime`] module runs it inside a tokio task for real use.

#![doc(html_root_url = "https://docs.rs/video_transport/0.1.0")]

pub mod config;
pub mod decoder;
pub mod error;
pub mod events;
pub mod runtime;
pub mod testing;
pub mod timer;
pub mod transport;
