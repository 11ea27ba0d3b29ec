//! Engine configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for a [`MixingEngine`](crate::engine::MixingEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gain ramp length in milliseconds, used for every volume write
    pub ramp_ms: f32,
    /// Master volume the engine starts with
    pub default_master_volume: f32,
    /// When true every `play` creates a new voice, even for a sound that
    /// is already playing
    pub multi_instance: bool,
    /// Keep generated buffers per sound id and share them between voices
    pub cache_buffers: bool,
    /// Frequency of the fallback sine when a generator fails
    pub fallback_frequency_hz: f32,
    /// Suspend the audio context while the host page is hidden
    pub suspend_when_hidden: bool,
    /// Length of a non-looping sustained tone, in seconds
    pub one_shot_secs: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ramp_ms: 20.0,
            default_master_volume: 1.0,
            multi_instance: false,
            cache_buffers: true,
            fallback_frequency_hz: 220.0,
            suspend_when_hidden: true,
            one_shot_secs: 8.0,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON, then sanitise it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load a config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Clamp out-of-range values instead of rejecting the whole file
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.ramp_ms.is_finite() || self.ramp_ms < 0.0 {
            self.ramp_ms = defaults.ramp_ms;
        }
        self.default_master_volume = if self.default_master_volume.is_finite() {
            self.default_master_volume.clamp(0.0, 1.0)
        } else {
            defaults.default_master_volume
        };
        if !self.fallback_frequency_hz.is_finite() || self.fallback_frequency_hz <= 0.0 {
            self.fallback_frequency_hz = defaults.fallback_frequency_hz;
        }
        if !self.one_shot_secs.is_finite() || self.one_shot_secs <= 0.0 {
            self.one_shot_secs = defaults.one_shot_secs;
        }
        self
    }
}
