//! Workload metrics: the sample data model and the providers that feed it.
//!
//! This module provides the [`Sample`] value recorded on every tick, the
//! [`MetricsProvider`] seam the sampler pulls readings through, and a
//! sysinfo/NVML implementation of it for the local host.

pub mod collector;
pub mod data;
pub mod gpu;
pub mod rate;
pub mod traits;

// Re-export commonly used items
pub use collector::SystemCollector;
pub use data::{ChannelStats, GpuReading, Sample, SessionSummary};
pub use rate::RateEstimator;
pub use traits::MetricsProvider;
