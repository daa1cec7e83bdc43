//! Background sampling loop.
//!
//! One task per recording. Each tick measures CPU over the configured window,
//! reads RAM and GPU, updates the rate estimator and hands the sample to the
//! engine, which stores and publishes it. The tick interval includes the CPU
//! window, so ticks start every `sample_interval` regardless of provider latency
//! (as long as the provider is faster than the interval).

use crate::config::ProfilerConfig;
use crate::error::{ProfilerError, Result};
use crate::metrics::{data::BYTES_PER_GB, GpuReading, MetricsProvider, RateEstimator, Sample};
use crate::session::engine::Shared;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

/// Raw channel values from one round of provider queries.
#[derive(Debug, Clone, Copy)]
struct Reading {
    cpu_percent: f64,
    ram_gb: f64,
    gpu: GpuReading,
}

/// Tracks whether GPU trouble has been logged yet, so it is reported once per recording.
#[derive(Debug, Default)]
struct GpuStatus {
    reported: bool,
}

impl GpuStatus {
    /// Turn a GPU query result into a reading, substituting zero on any error.
    fn reading_or_zero(&mut self, result: Result<GpuReading>) -> GpuReading {
        match result {
            Ok(reading) => reading,
            Err(ProfilerError::ProviderUnavailable(reason)) => {
                if !self.reported {
                    warn!("GPU unavailable, recording zero GPU/VRAM: {}", reason);
                    self.reported = true;
                }
                GpuReading::default()
            }
            Err(err) => {
                if !self.reported {
                    warn!("GPU query failed, recording zero GPU/VRAM: {}", err);
                    self.reported = true;
                }
                GpuReading::default()
            }
        }
    }
}

async fn take_reading<P: MetricsProvider>(
    provider: &AsyncMutex<P>,
    cpu_window: Duration,
    gpu_status: &mut GpuStatus,
) -> Result<Reading> {
    let mut provider = provider.lock().await;

    let cpu_percent = provider
        .cpu_percent(cpu_window)
        .await
        .map_err(|e| ProfilerError::sampling_failure(format!("CPU query failed: {}", e)))?;

    let ram_bytes = provider
        .ram_used_bytes()
        .await
        .map_err(|e| ProfilerError::sampling_failure(format!("RAM query failed: {}", e)))?;

    let gpu = gpu_status.reading_or_zero(provider.gpu().await);

    Ok(Reading {
        cpu_percent,
        ram_gb: ram_bytes as f64 / BYTES_PER_GB,
        gpu,
    })
}

/// Sample until shut down, replaced, or a provider query fails.
pub(crate) async fn run_sampler<P: MetricsProvider>(
    shared: Arc<Shared>,
    provider: Arc<AsyncMutex<P>>,
    run: u64,
    config: ProfilerConfig,
    mut shutdown: oneshot::Receiver<()>,
) {
    let session_start = Instant::now();
    let mut rate = RateEstimator::new(session_start);
    let mut gpu_status = GpuStatus::default();

    let mut ticker = interval(config.sample_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let elapsed_seconds = session_start.elapsed().as_secs_f64();

        let result = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = take_reading(provider.as_ref(), config.cpu_window(), &mut gpu_status) => result,
        };

        let reading = match result {
            Ok(reading) => reading,
            Err(err) => {
                error!("Monitoring error, recording stopped: {}", err);
                shared.fail_recording(run, err.to_string());
                break;
            }
        };

        let fps_estimate = rate.tick(Instant::now());
        let sample = Sample {
            elapsed_seconds,
            cpu_percent: reading.cpu_percent,
            ram_gb: reading.ram_gb,
            gpu_percent: reading.gpu.utilization_percent,
            vram_gb: reading.gpu.vram_gb(),
            fps_estimate,
        };

        if !shared.record_sample(run, sample) {
            break;
        }
        debug!(
            "t={:.2}s cpu={:.1}% ram={:.2}GB gpu={:.1}% vram={:.2}GB fps~{:.1}",
            sample.elapsed_seconds,
            sample.cpu_percent,
            sample.ram_gb,
            sample.gpu_percent,
            sample.vram_gb,
            sample.fps_estimate
        );
    }

    debug!("Sampler task {} exited", run);
}
