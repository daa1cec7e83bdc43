//! NVIDIA GPU readings through NVML.
//!
//! Feature-gated so the crate builds on machines without the NVIDIA driver.
//! Without the `nvml` feature every query reports the GPU as unavailable.

use crate::error::{ProfilerError, Result};
use crate::metrics::data::GpuReading;

#[cfg(feature = "nvml")]
use nvml_wrapper::Nvml;

/// Handle on the first (or a chosen) NVIDIA GPU.
pub struct NvidiaGpu {
    #[cfg(feature = "nvml")]
    nvml: Nvml,
    device_index: u32,
}

impl NvidiaGpu {
    /// Initialise NVML and check that GPU `index` exists.
    pub fn new(index: u32) -> Result<Self> {
        #[cfg(feature = "nvml")]
        {
            let nvml = Nvml::init().map_err(|e| {
                ProfilerError::provider_unavailable(format!("Failed to init NVML: {}", e))
            })?;

            nvml.device_by_index(index).map_err(|e| {
                ProfilerError::provider_unavailable(format!("GPU {} not found: {}", index, e))
            })?;

            Ok(Self {
                nvml,
                device_index: index,
            })
        }
        #[cfg(not(feature = "nvml"))]
        {
            let _ = index;
            Err(ProfilerError::provider_unavailable(
                "NVIDIA GPU support not enabled at compile time",
            ))
        }
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    /// Read utilization and memory of the device.
    pub fn read(&self) -> Result<GpuReading> {
        #[cfg(feature = "nvml")]
        {
            let device = self.nvml.device_by_index(self.device_index).map_err(|e| {
                ProfilerError::provider_unavailable(format!("Failed to get GPU device: {}", e))
            })?;

            let utilization = device.utilization_rates().map_err(|e| {
                ProfilerError::provider_unavailable(format!("Failed to read GPU utilization: {}", e))
            })?;

            let memory = device.memory_info().map_err(|e| {
                ProfilerError::provider_unavailable(format!("Failed to read GPU memory: {}", e))
            })?;

            Ok(GpuReading {
                utilization_percent: f64::from(utilization.gpu),
                vram_used_bytes: memory.used,
            })
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(ProfilerError::provider_unavailable(
                "NVIDIA GPU support not enabled at compile time",
            ))
        }
    }
}
