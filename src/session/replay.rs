use crate::error::{ProfilerError, Result};
use crate::metrics::Sample;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Playback state of a loaded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayState {
    /// Nothing loaded
    Idle,
    /// A sequence is loaded and the cursor is at 0
    Loaded,
    /// The playback timer is running
    Playing,
    /// Cancelled by the caller; the cursor shows how far playback got
    Stopped,
    /// Every sample was emitted
    Completed,
}

/// Outcome of one playback tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayStep {
    /// Emit this sample; the cursor has moved past it
    Emit(Sample),
    /// The end was reached on this tick
    Completed,
    /// Not playing, nothing to do
    Idle,
}

/// Cursor-driven playback of a loaded sequence.
///
/// Purely a state machine: the timer that drives [`ReplayEngine::advance`]
/// lives in the engine, so playback speed is independent of the timestamps
/// stored in the samples.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    sequence: Option<Arc<[Sample]>>,
    cursor: usize,
    state: ReplayState,
}

impl ReplayEngine {
    pub fn new() -> Self {
        Self {
            sequence: None,
            cursor: 0,
            state: ReplayState::Idle,
        }
    }

    /// Replace the loaded sequence. Empty input is rejected and leaves the
    /// current state untouched.
    pub fn load(&mut self, samples: Vec<Sample>) -> Result<usize> {
        if samples.is_empty() {
            return Err(ProfilerError::EmptyData);
        }
        let len = samples.len();
        self.sequence = Some(samples.into());
        self.cursor = 0;
        self.state = ReplayState::Loaded;
        Ok(len)
    }

    /// Enter `Playing` from any loaded state, rewinding to the start.
    pub fn begin(&mut self) -> Result<usize> {
        let len = match &self.sequence {
            Some(sequence) if !sequence.is_empty() => sequence.len(),
            _ => return Err(ProfilerError::EmptyData),
        };
        self.cursor = 0;
        self.state = ReplayState::Playing;
        Ok(len)
    }

    /// Run one playback tick.
    pub fn advance(&mut self) -> ReplayStep {
        if self.state != ReplayState::Playing {
            return ReplayStep::Idle;
        }
        let Some(sequence) = &self.sequence else {
            return ReplayStep::Idle;
        };
        match sequence.get(self.cursor) {
            Some(sample) => {
                let sample = *sample;
                self.cursor += 1;
                ReplayStep::Emit(sample)
            }
            None => {
                self.state = ReplayState::Completed;
                ReplayStep::Completed
            }
        }
    }

    /// Cancel playback, keeping the cursor. Returns `false` when not playing.
    pub fn stop(&mut self) -> bool {
        if self.state != ReplayState::Playing {
            return false;
        }
        self.state = ReplayState::Stopped;
        true
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of samples loaded, 0 when idle.
    pub fn len(&self) -> usize {
        self.sequence.as_ref().map_or(0, |sequence| sequence.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sequence(&self) -> Option<&[Sample]> {
        self.sequence.as_deref()
    }
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new()
    }
}
