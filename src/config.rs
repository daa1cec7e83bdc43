//! Profiler configuration.

use crate::error::{ProfilerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Cadences and buffer sizes for recording and replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Time between sampler ticks, including the CPU measurement window
    pub sample_interval_ms: u64,
    /// How long each CPU query blocks to get a stable percentage
    pub cpu_window_ms: u64,
    /// Time between replay ticks
    pub playback_interval_ms: u64,
    /// Number of samples kept per channel in the live window
    pub live_window_capacity: usize,
    /// Upper bound applied to the FPS estimate in the live window only
    pub fps_display_cap: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: crate::DEFAULT_SAMPLE_INTERVAL_MS,
            cpu_window_ms: crate::DEFAULT_CPU_WINDOW_MS,
            playback_interval_ms: crate::DEFAULT_PLAYBACK_INTERVAL_MS,
            live_window_capacity: crate::DEFAULT_LIVE_WINDOW_CAPACITY,
            fps_display_cap: crate::DEFAULT_FPS_DISPLAY_CAP,
        }
    }
}

impl ProfilerConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            ProfilerError::config_error(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the sampler tick interval.
    pub fn with_sample_interval_ms(mut self, ms: u64) -> Self {
        self.sample_interval_ms = ms;
        self
    }

    /// Set the CPU measurement window.
    pub fn with_cpu_window_ms(mut self, ms: u64) -> Self {
        self.cpu_window_ms = ms;
        self
    }

    /// Set the replay tick interval.
    pub fn with_playback_interval_ms(mut self, ms: u64) -> Self {
        self.playback_interval_ms = ms;
        self
    }

    /// Set the live window capacity.
    pub fn with_live_window_capacity(mut self, capacity: usize) -> Self {
        self.live_window_capacity = capacity;
        self
    }

    /// Set the display cap for the FPS channel.
    pub fn with_fps_display_cap(mut self, cap: f64) -> Self {
        self.fps_display_cap = cap;
        self
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_window_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms == 0 {
            return Err(ProfilerError::config_error("sample interval must be non-zero"));
        }
        if self.playback_interval_ms == 0 {
            return Err(ProfilerError::config_error("playback interval must be non-zero"));
        }
        if self.cpu_window_ms >= self.sample_interval_ms {
            return Err(ProfilerError::config_error(format!(
                "CPU window ({}ms) must be shorter than the sample interval ({}ms)",
                self.cpu_window_ms, self.sample_interval_ms
            )));
        }
        if self.live_window_capacity == 0 {
            return Err(ProfilerError::config_error("live window capacity must be non-zero"));
        }
        if self.fps_display_cap.is_nan() || self.fps_display_cap <= 0.0 {
            return Err(ProfilerError::config_error("FPS display cap must be positive"));
        }
        Ok(())
    }
}
