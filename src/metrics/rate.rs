//! Sampling-rate proxy reported in the FPS channel.
//!
//! This is not a frame counter. It counts sampler ticks and divides by wall
//! time, so it reflects how fast the profiler itself is polling. Callers that
//! read it as a rendering frame rate will be misled.

use std::time::Duration;
use tokio::time::Instant;

/// Minimum wall time between two estimates.
pub const ESTIMATE_WINDOW: Duration = Duration::from_secs(1);

/// Tick-rate estimator that recomputes at most once per [`ESTIMATE_WINDOW`].
#[derive(Debug, Clone)]
pub struct RateEstimator {
    ticks: u64,
    last_estimate_at: Instant,
    current: f64,
}

impl RateEstimator {
    /// Start counting from `now`. The estimate is 0 until the first window closes.
    pub fn new(now: Instant) -> Self {
        Self {
            ticks: 0,
            last_estimate_at: now,
            current: 0.0,
        }
    }

    /// Register one tick at `now` and return the estimate to record for it.
    ///
    /// Once at least a second has passed since the last estimate the new value
    /// is `ticks / elapsed` and the counter restarts; otherwise the previous
    /// value is held.
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.ticks += 1;
        let elapsed = now.saturating_duration_since(self.last_estimate_at);
        if elapsed >= ESTIMATE_WINDOW {
            self.current = self.ticks as f64 / elapsed.as_secs_f64();
            self.ticks = 0;
            self.last_estimate_at = now;
        }
        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}
