//! Recording/replay coordinator.
//!
//! [`ProfilerEngine`] owns the live window, the session log and the replay
//! state behind one lock, and runs at most one producer at a time: the
//! sampler while recording, the playback timer while replaying. Starting
//! either producer stops the other first.
//!
//! Producers only write (and publish) while holding the lock and after
//! checking they are still the active writer. Stopping a producer flips the
//! writer under the same lock, so once a stop call returns no further sample
//! from that producer can reach the live window, the log or the subscriber.

use crate::config::ProfilerConfig;
use crate::error::{ProfilerError, Result};
use crate::metrics::{MetricsProvider, Sample};
use crate::session::{
    csv,
    live_window::LiveWindow,
    replay::{ReplayEngine, ReplayState, ReplayStep},
    sampler::run_sampler,
    session_log::SessionLog,
};
use futures_util::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

/// Which producer currently owns the live window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineMode {
    Idle,
    Recording,
    Replaying,
}

/// Where a published sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleSource {
    Recording,
    Replay,
}

/// Notifications delivered to the subscriber, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// One tick's sample. The FPS channel is unclamped.
    Sample { source: SampleSource, sample: Sample },
    RecordingStarted,
    RecordingStopped { samples: usize },
    /// The sampler hit an error and stopped; the log up to here is kept.
    RecordingFailed { reason: String, samples: usize },
    ReplayStarted { len: usize },
    ReplayCompleted { emitted: usize },
    ReplayStopped { cursor: usize },
}

/// Receiving end of the engine's event channel.
pub struct EngineEvents {
    rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineEvents {
    /// Wait for the next event. `None` once the engine and its tasks are gone.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }

    pub fn into_stream(self) -> BoxStream<'static, EngineEvent> {
        UnboundedReceiverStream::new(self.rx).boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Writer {
    None,
    Recording(u64),
    Replaying(u64),
}

struct EngineState {
    writer: Writer,
    live: LiveWindow,
    session: SessionLog,
    replay: ReplayEngine,
}

/// State shared between the engine handle and its producer task.
pub(crate) struct Shared {
    state: Mutex<EngineState>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl Shared {
    fn emit(&self, event: EngineEvent) {
        // A dropped receiver just means nobody is listening
        let _ = self.events.send(event);
    }

    /// Store and publish one recorded sample. Returns `false` when `run` is
    /// no longer the active recording, telling the sampler to exit.
    pub(crate) fn record_sample(&self, run: u64, sample: Sample) -> bool {
        let mut state = self.state.lock();
        if state.writer != Writer::Recording(run) {
            return false;
        }
        if let Err(err) = state.session.append(sample) {
            warn!("Dropping sample for run {}: {}", run, err);
            return false;
        }
        state.live.push(&sample);
        self.emit(EngineEvent::Sample {
            source: SampleSource::Recording,
            sample,
        });
        true
    }

    /// End recording `run` after a sampling failure.
    pub(crate) fn fail_recording(&self, run: u64, reason: String) {
        let mut state = self.state.lock();
        if state.writer != Writer::Recording(run) {
            return;
        }
        state.writer = Writer::None;
        state.session.freeze();
        let samples = state.session.len();
        self.emit(EngineEvent::RecordingFailed { reason, samples });
    }

    /// Run one playback tick for replay `run`. Returns `false` when playback is over.
    fn replay_tick(&self, run: u64) -> bool {
        let mut state = self.state.lock();
        if state.writer != Writer::Replaying(run) {
            return false;
        }
        match state.replay.advance() {
            ReplayStep::Emit(sample) => {
                state.live.push(&sample);
                self.emit(EngineEvent::Sample {
                    source: SampleSource::Replay,
                    sample,
                });
                true
            }
            ReplayStep::Completed => {
                state.writer = Writer::None;
                let emitted = state.replay.cursor();
                info!("Replay completed after {} samples", emitted);
                self.emit(EngineEvent::ReplayCompleted { emitted });
                false
            }
            ReplayStep::Idle => {
                state.writer = Writer::None;
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerKind {
    Sampler,
    Player,
}

struct Worker {
    kind: WorkerKind,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn cancel(self) {
        let _ = self.shutdown.send(());
        if self.handle.is_finished() {
            debug!("{:?} task had already finished", self.kind);
        }
    }
}

/// Telemetry recorder and replayer.
pub struct ProfilerEngine<P: MetricsProvider> {
    shared: Arc<Shared>,
    provider: Arc<AsyncMutex<P>>,
    config: ProfilerConfig,
    runtime: Handle,
    next_run: u64,
    worker: Option<Worker>,
}

impl<P: MetricsProvider> ProfilerEngine<P> {
    /// Create an engine and the receiver for its events.
    ///
    /// Must be called inside a tokio runtime; producer tasks are spawned on it.
    pub fn new(provider: P, config: ProfilerConfig) -> Result<(Self, EngineEvents)> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| {
            ProfilerError::config_error("the profiler engine must be created inside a tokio runtime")
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(EngineState {
                writer: Writer::None,
                live: LiveWindow::new(config.live_window_capacity, config.fps_display_cap),
                session: SessionLog::default(),
                replay: ReplayEngine::new(),
            }),
            events: tx,
        });

        let engine = Self {
            shared,
            provider: Arc::new(AsyncMutex::new(provider)),
            config,
            runtime,
            next_run: 0,
            worker: None,
        };
        Ok((engine, EngineEvents { rx }))
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    fn allocate_run(&mut self) -> u64 {
        self.next_run += 1;
        self.next_run
    }

    fn cancel_worker(&mut self, kind: WorkerKind) {
        if self.worker.as_ref().is_some_and(|worker| worker.kind == kind) {
            if let Some(worker) = self.worker.take() {
                worker.cancel();
            }
        }
    }

    /// Start a new recording session.
    ///
    /// Stops any replay or running recording first, then replaces the session
    /// log with an empty one and clears the live window.
    pub fn start_recording(&mut self) -> Result<()> {
        self.stop_replay();
        self.stop_recording();

        let run = self.allocate_run();
        {
            let mut state = self.shared.state.lock();
            state.session = SessionLog::start();
            state.live.clear();
            state.writer = Writer::Recording(run);
            self.shared.emit(EngineEvent::RecordingStarted);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = self.runtime.spawn(run_sampler(
            Arc::clone(&self.shared),
            Arc::clone(&self.provider),
            run,
            self.config.clone(),
            shutdown_rx,
        ));
        self.worker = Some(Worker {
            kind: WorkerKind::Sampler,
            shutdown: shutdown_tx,
            handle,
        });

        info!(
            "Recording started with {}ms interval",
            self.config.sample_interval_ms
        );
        Ok(())
    }

    /// Stop the current recording and freeze its log.
    ///
    /// Returns `false` if nothing was recording.
    pub fn stop_recording(&mut self) -> bool {
        let stopped = {
            let mut state = self.shared.state.lock();
            if let Writer::Recording(_) = state.writer {
                state.writer = Writer::None;
                state.session.freeze();
                let samples = state.session.len();
                self.shared.emit(EngineEvent::RecordingStopped { samples });
                info!("Recording stopped with {} samples", samples);
                true
            } else {
                false
            }
        };
        self.cancel_worker(WorkerKind::Sampler);
        stopped
    }

    /// Load a CSV file as the replay sequence.
    ///
    /// On any error the previously loaded sequence and replay state are kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let samples = csv::read_file(path)?;
        let len = self.load_samples(samples)?;
        info!("Loaded {} data points from {}", len, path.display());
        Ok(len)
    }

    /// Use `samples` as the replay sequence. Stops a running replay first.
    pub fn load_samples(&mut self, samples: Vec<Sample>) -> Result<usize> {
        if samples.is_empty() {
            return Err(ProfilerError::EmptyData);
        }
        self.stop_replay();
        let mut state = self.shared.state.lock();
        state.replay.load(samples)
    }

    /// Play the loaded sequence from the start.
    ///
    /// Fails with [`ProfilerError::EmptyData`] without touching anything when
    /// no sequence is loaded. Otherwise stops any recording or replay, clears
    /// the live window and starts the playback timer.
    pub fn start_replay(&mut self) -> Result<()> {
        if self.shared.state.lock().replay.is_empty() {
            return Err(ProfilerError::EmptyData);
        }
        self.stop_recording();
        self.stop_replay();

        let run = self.allocate_run();
        {
            let mut state = self.shared.state.lock();
            let len = state.replay.begin()?;
            state.live.clear();
            state.writer = Writer::Replaying(run);
            self.shared.emit(EngineEvent::ReplayStarted { len });
            info!("Replaying {} data points", len);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = self.runtime.spawn(run_player(
            Arc::clone(&self.shared),
            run,
            self.config.playback_interval(),
            shutdown_rx,
        ));
        self.worker = Some(Worker {
            kind: WorkerKind::Player,
            shutdown: shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Cancel playback, keeping the cursor. Returns `false` if not playing.
    pub fn stop_replay(&mut self) -> bool {
        let stopped = {
            let mut state = self.shared.state.lock();
            if let Writer::Replaying(_) = state.writer {
                state.writer = Writer::None;
                state.replay.stop();
                let cursor = state.replay.cursor();
                self.shared.emit(EngineEvent::ReplayStopped { cursor });
                info!("Replay stopped at {}", cursor);
                true
            } else {
                false
            }
        };
        self.cancel_worker(WorkerKind::Player);
        stopped
    }

    /// Write the current session log to `path` and return the row count.
    ///
    /// The log is snapshotted under the lock, so exporting while recording
    /// yields a consistent prefix. An empty log reports [`ProfilerError::EmptyData`].
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let samples = self.session_samples();
        if samples.is_empty() {
            return Err(ProfilerError::EmptyData);
        }
        csv::write_file(path.as_ref(), &samples)?;
        info!(
            "Exported {} samples to {}",
            samples.len(),
            path.as_ref().display()
        );
        Ok(samples.len())
    }

    /// Suggested file name for exporting the current session.
    pub fn default_export_name(&self) -> String {
        self.shared.state.lock().session.default_file_name()
    }

    /// Copy of the session log.
    pub fn session_samples(&self) -> Vec<Sample> {
        self.shared.state.lock().session.samples().to_vec()
    }

    /// Copy of the live window, oldest first, FPS capped for display.
    pub fn live_samples(&self) -> Vec<Sample> {
        self.shared.state.lock().live.samples()
    }

    /// Most recent display sample.
    pub fn latest(&self) -> Option<Sample> {
        self.shared.state.lock().live.latest()
    }

    /// Copy of the loaded replay sequence, empty when nothing is loaded.
    pub fn replay_samples(&self) -> Vec<Sample> {
        self.shared
            .state
            .lock()
            .replay
            .sequence()
            .map(<[Sample]>::to_vec)
            .unwrap_or_default()
    }

    pub fn mode(&self) -> EngineMode {
        match self.shared.state.lock().writer {
            Writer::None => EngineMode::Idle,
            Writer::Recording(_) => EngineMode::Recording,
            Writer::Replaying(_) => EngineMode::Replaying,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.mode() == EngineMode::Recording
    }

    pub fn replay_state(&self) -> ReplayState {
        self.shared.state.lock().replay.state()
    }

    pub fn replay_cursor(&self) -> usize {
        self.shared.state.lock().replay.cursor()
    }

    pub fn replay_len(&self) -> usize {
        self.shared.state.lock().replay.len()
    }
}

impl<P: MetricsProvider> Drop for ProfilerEngine<P> {
    fn drop(&mut self) {
        self.shared.state.lock().writer = Writer::None;
        if let Some(worker) = self.worker.take() {
            worker.cancel();
        }
    }
}

/// Playback timer: one replay tick per `period`, first tick immediately.
async fn run_player(
    shared: Arc<Shared>,
    run: u64,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        if !shared.replay_tick(run) {
            break;
        }
    }
    debug!("Replay task {} exited", run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::GpuReading;

    struct FixedProvider;

    impl MetricsProvider for FixedProvider {
        async fn cpu_percent(&mut self, window: Duration) -> Result<f64> {
            tokio::time::sleep(window).await;
            Ok(12.5)
        }

        async fn ram_used_bytes(&mut self) -> Result<u64> {
            Ok(1024 * 1024 * 1024)
        }

        async fn gpu(&mut self) -> Result<GpuReading> {
            Err(ProfilerError::provider_unavailable("no GPU"))
        }
    }

    fn config() -> ProfilerConfig {
        ProfilerConfig::default().with_live_window_capacity(4)
    }

    #[test]
    fn test_requires_runtime() {
        let err = ProfilerEngine::new(FixedProvider, config()).err().unwrap();
        assert!(matches!(err, ProfilerError::Config(_)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let bad = ProfilerConfig::default().with_live_window_capacity(0);
        assert!(ProfilerEngine::new(FixedProvider, bad).is_err());
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (engine, mut events) = ProfilerEngine::new(FixedProvider, config()).unwrap();
        assert_eq!(engine.mode(), EngineMode::Idle);
        assert_eq!(engine.replay_state(), ReplayState::Idle);
        assert!(engine.session_samples().is_empty());
        assert!(engine.latest().is_none());
        assert!(events.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_window_is_bounded_during_recording() {
        let (mut engine, mut events) = ProfilerEngine::new(FixedProvider, config()).unwrap();
        engine.start_recording().unwrap();
        assert_eq!(events.recv().await, Some(EngineEvent::RecordingStarted));

        for _ in 0..6 {
            match events.recv().await {
                Some(EngineEvent::Sample { source, .. }) => {
                    assert_eq!(source, SampleSource::Recording)
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        engine.stop_recording();

        assert_eq!(engine.session_samples().len(), 6);
        let live = engine.live_samples();
        assert_eq!(live.len(), 4);
        assert_eq!(live, engine.session_samples()[2..].to_vec());
        assert_eq!(engine.latest().unwrap().ram_gb, 1.0);
        assert_eq!(engine.latest().unwrap().gpu_percent, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_noop() {
        let (mut engine, mut events) = ProfilerEngine::new(FixedProvider, config()).unwrap();
        assert!(!engine.stop_recording());
        assert!(!engine.stop_replay());
        assert!(events.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_delivers_events_in_order() {
        let (mut engine, events) = ProfilerEngine::new(FixedProvider, config()).unwrap();
        engine
            .load_samples(vec![
                Sample::new(0.0, 1.0, 1.0, 0.0, 0.0, 0.0),
                Sample::new(0.5, 2.0, 1.0, 0.0, 0.0, 0.0),
            ])
            .unwrap();
        engine.start_replay().unwrap();

        let collected: Vec<EngineEvent> = events.into_stream().take(4).collect().await;
        assert_eq!(collected[0], EngineEvent::ReplayStarted { len: 2 });
        assert!(matches!(collected[1], EngineEvent::Sample { source: SampleSource::Replay, .. }));
        assert!(matches!(collected[2], EngineEvent::Sample { source: SampleSource::Replay, .. }));
        assert_eq!(collected[3], EngineEvent::ReplayCompleted { emitted: 2 });
        assert_eq!(engine.replay_state(), ReplayState::Completed);
        assert_eq!(engine.mode(), EngineMode::Idle);
    }
}
