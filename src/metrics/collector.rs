//! Metrics provider backed by sysinfo and NVML.

use crate::error::{ProfilerError, Result};
use crate::metrics::{data::GpuReading, gpu::NvidiaGpu, traits::MetricsProvider};
use std::time::Duration;
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, RefreshKind, System, MINIMUM_CPU_UPDATE_INTERVAL,
};

/// Host-wide CPU, RAM and GPU readings.
pub struct SystemCollector {
    system: System,
    gpu: Option<NvidiaGpu>,
    gpu_reason: Option<String>,
}

impl SystemCollector {
    /// Create a new collector. A missing GPU is not an error.
    pub fn new() -> Result<Self> {
        let refresh_kind = RefreshKind::new()
            .with_cpu(CpuRefreshKind::new().with_cpu_usage())
            .with_memory(MemoryRefreshKind::new().with_ram());
        let system = System::new_with_specifics(refresh_kind);

        if system.cpus().is_empty() {
            return Err(ProfilerError::sampling_failure("No CPU information available"));
        }

        let (gpu, gpu_reason) = match NvidiaGpu::new(0) {
            Ok(gpu) => {
                tracing::info!("GPU metrics from NVIDIA device {}", gpu.device_index());
                (Some(gpu), None)
            }
            Err(err) => {
                tracing::warn!("GPU metrics unavailable, reporting zero: {}", err);
                (None, Some(err.to_string()))
            }
        };

        Ok(Self {
            system,
            gpu,
            gpu_reason,
        })
    }

    /// Whether GPU readings will be real rather than zero.
    pub fn has_gpu(&self) -> bool {
        self.gpu.is_some()
    }

    fn average_cpu_usage(&self) -> Result<f64> {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(ProfilerError::sampling_failure("No CPU information available"));
        }
        let total: f64 = cpus.iter().map(|cpu| f64::from(cpu.cpu_usage())).sum();
        Ok(total / cpus.len() as f64)
    }
}

impl MetricsProvider for SystemCollector {
    /// Average usage over all logical cores.
    ///
    /// sysinfo ignores refreshes closer together than
    /// [`MINIMUM_CPU_UPDATE_INTERVAL`], so the window is raised to that floor.
    /// Shorter windows would report the usage since the previous call instead.
    async fn cpu_percent(&mut self, window: Duration) -> Result<f64> {
        // Usage is the delta between two refreshes
        self.system.refresh_cpu_usage();
        tokio::time::sleep(window.max(MINIMUM_CPU_UPDATE_INTERVAL)).await;
        self.system.refresh_cpu_usage();
        self.average_cpu_usage()
    }

    async fn ram_used_bytes(&mut self) -> Result<u64> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(ProfilerError::sampling_failure("No memory information available"));
        }
        Ok(self.system.used_memory())
    }

    async fn gpu(&mut self) -> Result<GpuReading> {
        match &self.gpu {
            Some(gpu) => gpu.read(),
            None => Err(ProfilerError::provider_unavailable(
                self.gpu_reason.clone().unwrap_or_else(|| "no GPU".to_string()),
            )),
        }
    }
}
