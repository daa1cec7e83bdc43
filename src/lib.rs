//! # Session Profiler - Workload Telemetry Recorder
//!
//! Samples CPU, RAM, GPU and VRAM usage of the host while a workload runs,
//! keeps a bounded live view for display and an unbounded session log for
//! export, writes sessions to CSV and replays saved sessions at a fixed
//! playback cadence.
//!
//! ## Features
//!
//! - **Background sampling**: fixed cadence, CPU measured over a short window
//! - **Live window**: last N samples per channel, FPS capped for display
//! - **Session log**: every sample of the recording, unclamped, exportable
//! - **CSV codec**: lossless `timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps`
//! - **Replay**: timer-driven playback independent of recorded timestamps
//!
//! The FPS channel is a sampling-rate proxy, not a rendered frame count.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use session_profiler::{EngineEvent, ProfilerConfig, ProfilerEngine, SystemCollector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collector = SystemCollector::new()?;
//!     let (mut engine, mut events) = ProfilerEngine::new(collector, ProfilerConfig::default())?;
//!
//!     engine.start_recording()?;
//!     while let Some(event) = events.recv().await {
//!         if let EngineEvent::Sample { sample, .. } = event {
//!             println!("{:.1}% CPU", sample.cpu_percent);
//!             if sample.elapsed_seconds > 5.0 {
//!                 break;
//!             }
//!         }
//!     }
//!     engine.stop_recording();
//!     engine.export_csv(engine.default_export_name())?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod session;
pub mod workload;

// Re-export public API
pub use config::ProfilerConfig;
pub use error::{ProfilerError, Result};
pub use metrics::{
    collector::SystemCollector,
    data::{ChannelStats, GpuReading, Sample, SessionSummary},
    traits::MetricsProvider,
};
pub use session::{
    EngineEvent, EngineEvents, EngineMode, LiveWindow, ProfilerEngine, ReplayEngine, ReplayState,
    SampleSource, SessionLog,
};
pub use workload::Workload;

/// The default sampling interval in milliseconds
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 500;

/// The default CPU measurement window in milliseconds
pub const DEFAULT_CPU_WINDOW_MS: u64 = 100;

/// The default replay interval in milliseconds
pub const DEFAULT_PLAYBACK_INTERVAL_MS: u64 = 250;

/// The default number of samples kept per channel in the live window
pub const DEFAULT_LIVE_WINDOW_CAPACITY: usize = 100;

/// The default cap applied to the FPS channel for display
pub const DEFAULT_FPS_DISPLAY_CAP: f64 = 20.0;
