//! Error handling for the session profiler.

use std::path::PathBuf;

/// A specialized `Result` type for profiler operations.
pub type Result<T> = std::result::Result<T, ProfilerError>;

/// The main error type for profiler operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfilerError {
    /// A single metric source is missing (no GPU, driver not loaded).
    ///
    /// Never fatal: the sampler substitutes zero and keeps going.
    #[error("Metric provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Any other failure inside a sampling tick. Ends the recording.
    #[error("Sampling failed: {0}")]
    SamplingFailure(String),

    /// Malformed CSV header or row
    #[error("CSV decode error on line {line}: {reason}")]
    Decode { line: usize, reason: String },

    /// Nothing to export, load or replay
    #[error("No data")]
    EmptyData,

    /// Writing a CSV file failed
    #[error("Failed to export to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Launching or terminating the monitored workload failed
    #[error("Workload error: {0}")]
    Workload(String),
}

impl ProfilerError {
    /// Create a new provider-unavailable error
    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create a new sampling failure
    pub fn sampling_failure(msg: impl Into<String>) -> Self {
        Self::SamplingFailure(msg.into())
    }

    /// Create a new decode error for a 1-based line number
    pub fn decode_error(line: usize, reason: impl Into<String>) -> Self {
        Self::Decode {
            line,
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new workload error
    pub fn workload_error(msg: impl Into<String>) -> Self {
        Self::Workload(msg.into())
    }

    /// Whether this is the "no data" condition rather than a real failure.
    pub fn is_empty_data(&self) -> bool {
        matches!(self, Self::EmptyData)
    }
}
