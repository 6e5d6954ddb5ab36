// SPDX-License-Identifier: MPL-2.0
//! This module handles the transport configuration, including loading and saving
//! user preferences to a `transport.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use video_transport::config::{self, TransportConfig};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.autoplay = true;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::Result;
use crate::transport::RefreshInterval;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "transport.toml";
const APP_NAME: &str = "VideoTransport";

/// User-tunable transport behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Start playing as soon as the media is ready.
    pub autoplay: bool,
    /// Remaining-time label counts down instead of showing the full length.
    pub auto_decrement_remaining_time: bool,
    /// Seconds before controls auto-hide after an interaction. Zero disables auto-hide.
    pub controls_display_duration_secs: f64,
    /// A tap on the video surface shows the controls.
    pub display_controls_on_tap: bool,
    /// Controls are never auto-hidden.
    pub dont_hide_controls: bool,
    /// Seconds between time-display refresh ticks.
    pub time_display_refresh_interval_secs: f64,
    /// Position confirming the first rendered frame. Zero disables the check.
    pub first_frame_boundary_secs: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            auto_decrement_remaining_time: false,
            controls_display_duration_secs: DEFAULT_CONTROLS_DISPLAY_DURATION_SECS,
            display_controls_on_tap: false,
            dont_hide_controls: false,
            time_display_refresh_interval_secs: DEFAULT_TIME_DISPLAY_REFRESH_SECS,
            first_frame_boundary_secs: FIRST_FRAME_BOUNDARY_SECS,
        }
    }
}

impl TransportConfig {
    /// Returns the validated refresh interval (invalid values fall back to the default).
    #[must_use]
    pub fn refresh_interval(&self) -> RefreshInterval {
        RefreshInterval::new(self.time_display_refresh_interval_secs)
    }

    /// Returns the controls display duration actually applied to the policy.
    #[must_use]
    pub fn effective_display_duration(&self) -> Duration {
        if self.dont_hide_controls {
            return Duration::ZERO;
        }
        secs_to_duration(self.controls_display_duration_secs)
    }

    /// Returns the first-frame boundary, if enabled and valid.
    #[must_use]
    pub fn first_frame_boundary(&self) -> Option<Duration> {
        let boundary = secs_to_duration(self.first_frame_boundary_secs);
        (!boundary.is_zero()).then_some(boundary)
    }
}

/// Converts seconds to a duration, mapping negative or non-finite values to zero.
///
/// Values beyond what a `Duration` can hold saturate to `Duration::MAX`.
pub(crate) fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<TransportConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(TransportConfig::default())
}

pub fn save(config: &TransportConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<TransportConfig> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            log::warn!("Ignoring invalid transport config {:?}: {}", path, err);
            Ok(TransportConfig::default())
        }
    }
}

pub fn save_to_path(config: &TransportConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
