//! Recording, buffering, persistence and replay of telemetry sessions.

pub mod csv;
pub mod engine;
pub mod live_window;
pub mod replay;
mod sampler;
pub mod session_log;

// Re-export commonly used items
pub use engine::{EngineEvent, EngineEvents, EngineMode, ProfilerEngine, SampleSource};
pub use live_window::LiveWindow;
pub use replay::{ReplayEngine, ReplayState, ReplayStep};
pub use session_log::SessionLog;
