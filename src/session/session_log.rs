use crate::error::{ProfilerError, Result};
use crate::metrics::Sample;
use chrono::{DateTime, Local};

/// Every sample of the current recording, unclamped, in capture order.
///
/// Grows by one sample per sampler tick and is frozen when the recording
/// stops. A new recording replaces it with a fresh log.
#[derive(Debug, Clone)]
pub struct SessionLog {
    started_at: DateTime<Local>,
    samples: Vec<Sample>,
    frozen: bool,
}

impl SessionLog {
    /// Start an empty log stamped with the current local time.
    pub fn start() -> Self {
        Self::started_at(Local::now())
    }

    pub fn started_at(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            samples: Vec::new(),
            frozen: false,
        }
    }

    /// Append a sample. Fails once the log is frozen.
    pub fn append(&mut self, sample: Sample) -> Result<()> {
        if self.frozen {
            return Err(ProfilerError::sampling_failure(
                "session log is frozen; start a new recording",
            ));
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Make the log read-only.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Suggested export name, `benchmark_YYYYMMDD_HHMMSS.csv`.
    pub fn default_file_name(&self) -> String {
        format!("benchmark_{}.csv", self.started_at.format("%Y%m%d_%H%M%S"))
    }
}

impl Default for SessionLog {
    /// An empty, frozen log: nothing has been recorded yet.
    fn default() -> Self {
        let mut log = Self::start();
        log.freeze();
        log
    }
}
