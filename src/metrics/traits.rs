//! Traits for workload metrics collection.

use crate::error::Result;
use crate::metrics::data::GpuReading;
use std::time::Duration;

/// Source of instantaneous resource readings.
///
/// Implementations are queried once per sampler tick from a background task,
/// so every future must be `Send`. Each metric is queried separately because
/// they fail independently.
pub trait MetricsProvider: Send + 'static {
    /// CPU usage percentage measured over `window`.
    ///
    /// Blocks (asynchronously) for the whole window to get a stable figure.
    fn cpu_percent(
        &mut self,
        window: Duration,
    ) -> impl std::future::Future<Output = Result<f64>> + Send;

    /// RAM currently in use, in bytes.
    fn ram_used_bytes(&mut self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// GPU utilization and VRAM of the first GPU.
    ///
    /// Machines without a supported GPU return
    /// [`ProfilerError::ProviderUnavailable`](crate::ProfilerError::ProviderUnavailable).
    fn gpu(&mut self) -> impl std::future::Future<Output = Result<GpuReading>> + Send;
}
