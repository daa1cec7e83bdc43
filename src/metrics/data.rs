//! Data structures for workload telemetry.

use serde::{Deserialize, Serialize};

/// Bytes per gigabyte as reported in samples (binary, 1024^3).
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One timestamped reading of every channel.
///
/// All five channels advance together: a sample is only ever written as a
/// whole, never channel by channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the start of the current recording or replay
    pub elapsed_seconds: f64,
    /// CPU usage percentage as reported by the provider (not clamped)
    pub cpu_percent: f64,
    /// RAM in use, in GB
    pub ram_gb: f64,
    /// GPU utilization percentage, 0 when no GPU is available
    pub gpu_percent: f64,
    /// VRAM in use, in GB, 0 when no GPU is available
    pub vram_gb: f64,
    /// Sampling-rate proxy, see [`crate::metrics::RateEstimator`]
    pub fps_estimate: f64,
}

impl Sample {
    pub fn new(
        elapsed_seconds: f64,
        cpu_percent: f64,
        ram_gb: f64,
        gpu_percent: f64,
        vram_gb: f64,
        fps_estimate: f64,
    ) -> Self {
        Self {
            elapsed_seconds,
            cpu_percent,
            ram_gb,
            gpu_percent,
            vram_gb,
            fps_estimate,
        }
    }

    /// Copy of this sample with the FPS channel capped for display.
    pub fn for_display(&self, fps_cap: f64) -> Self {
        Self {
            fps_estimate: self.fps_estimate.min(fps_cap),
            ..*self
        }
    }

    /// Field-for-field comparison within a relative tolerance.
    pub fn approx_eq(&self, other: &Sample, rel_tolerance: f64) -> bool {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .all(|(a, b)| {
                let scale = a.abs().max(b.abs()).max(1.0);
                (a - b).abs() <= rel_tolerance * scale
            })
    }

    /// Channel values in CSV column order.
    pub fn fields(&self) -> [f64; 6] {
        [
            self.elapsed_seconds,
            self.cpu_percent,
            self.ram_gb,
            self.gpu_percent,
            self.vram_gb,
            self.fps_estimate,
        ]
    }
}

/// GPU utilization and memory from a single provider query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuReading {
    /// GPU utilization percentage (0.0 to 100.0)
    pub utilization_percent: f64,
    /// VRAM in use in bytes
    pub vram_used_bytes: u64,
}

impl GpuReading {
    pub fn vram_gb(&self) -> f64 {
        self.vram_used_bytes as f64 / BYTES_PER_GB
    }
}

/// Minimum, maximum and mean of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ChannelStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            min,
            max,
            mean: sum / count as f64,
        }
    }
}

/// Aggregate view of a recorded or loaded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Number of samples
    pub samples: usize,
    /// Elapsed time covered, last timestamp minus first
    pub duration_seconds: f64,
    pub cpu_percent: ChannelStats,
    pub ram_gb: ChannelStats,
    pub gpu_percent: ChannelStats,
    pub vram_gb: ChannelStats,
    pub fps_estimate: ChannelStats,
}

impl SessionSummary {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let duration_seconds = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => last.elapsed_seconds - first.elapsed_seconds,
            _ => 0.0,
        };

        Self {
            samples: samples.len(),
            duration_seconds,
            cpu_percent: ChannelStats::from_values(samples.iter().map(|s| s.cpu_percent)),
            ram_gb: ChannelStats::from_values(samples.iter().map(|s| s.ram_gb)),
            gpu_percent: ChannelStats::from_values(samples.iter().map(|s| s.gpu_percent)),
            vram_gb: ChannelStats::from_values(samples.iter().map(|s| s.vram_gb)),
            fps_estimate: ChannelStats::from_values(samples.iter().map(|s| s.fps_estimate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_copy_caps_fps_only() {
        let sample = Sample::new(1.0, 50.0, 2.0, 10.0, 1.5, 42.0);
        let shown = sample.for_display(20.0);
        assert_eq!(shown.fps_estimate, 20.0);
        assert_eq!(shown.cpu_percent, 50.0);
        assert_eq!(sample.fps_estimate, 42.0);

        let low = Sample::new(1.0, 50.0, 2.0, 10.0, 1.5, 4.0).for_display(20.0);
        assert_eq!(low.fps_estimate, 4.0);
    }

    #[test]
    fn test_approx_eq() {
        let a = Sample::new(0.5, 15.0, 2.1, 0.0, 0.0, 2.0);
        let mut b = a;
        b.ram_gb += 1e-12;
        assert!(a.approx_eq(&b, 1e-9));
        b.cpu_percent = 16.0;
        assert!(!a.approx_eq(&b, 1e-9));
    }

    #[test]
    fn test_summary() {
        let samples = vec![
            Sample::new(0.0, 10.0, 2.0, 0.0, 0.0, 0.0),
            Sample::new(0.5, 15.0, 2.1, 0.0, 0.0, 2.0),
            Sample::new(1.0, 20.0, 2.2, 0.0, 0.0, 4.0),
        ];
        let summary = SessionSummary::from_samples(&samples);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.duration_seconds, 1.0);
        assert_eq!(summary.cpu_percent.min, 10.0);
        assert_eq!(summary.cpu_percent.max, 20.0);
        assert!((summary.cpu_percent.mean - 15.0).abs() < 1e-9);
        assert_eq!(summary.fps_estimate.max, 4.0);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = SessionSummary::from_samples(&[]);
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.duration_seconds, 0.0);
        assert_eq!(summary.cpu_percent, ChannelStats::default());
    }

    #[test]
    fn test_gpu_reading_vram_gb() {
        let reading = GpuReading {
            utilization_percent: 30.0,
            vram_used_bytes: 2 * 1024 * 1024 * 1024,
        };
        assert_eq!(reading.vram_gb(), 2.0);
    }
}
