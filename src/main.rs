//! Session Profiler binary
//!
//! Records workload telemetry to CSV, replays saved sessions and summarizes them.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use session_profiler::{
    session::csv, EngineEvent, ProfilerConfig, ProfilerEngine, Sample, SessionSummary,
    SystemCollector, Workload, DEFAULT_CPU_WINDOW_MS, DEFAULT_LIVE_WINDOW_CAPACITY,
    DEFAULT_PLAYBACK_INTERVAL_MS, DEFAULT_SAMPLE_INTERVAL_MS,
};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "session_profiler")]
#[command(about = "Workload telemetry recorder with CSV export and replay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Samples CPU, RAM, GPU and VRAM while a workload runs, exports the session to CSV and replays saved sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with profiler settings; flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sampling interval in milliseconds
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// CPU measurement window in milliseconds
    #[arg(long, global = true)]
    cpu_window: Option<u64>,

    /// Replay interval in milliseconds
    #[arg(long, global = true)]
    playback_interval: Option<u64>,

    /// Samples kept in the live window
    #[arg(long, global = true)]
    window_capacity: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a session, optionally while running a workload
    Record(RecordArgs),

    /// Replay a saved session
    Replay(ReplayArgs),

    /// Summarize a saved session
    Inspect(InspectArgs),
}

#[derive(Args)]
struct RecordArgs {
    /// CSV file to write (default: benchmark_<start time>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Workload to launch; recording stops when it exits
    program: Option<PathBuf>,

    /// Arguments passed to the workload, after `--`
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Args)]
struct ReplayArgs {
    /// CSV file recorded earlier
    file: PathBuf,
}

#[derive(Args)]
struct InspectArgs {
    /// CSV file recorded earlier
    file: PathBuf,

    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Record(args) => record_command(config, args).await?,
        Commands::Replay(args) => replay_command(config, args).await?,
        Commands::Inspect(args) => inspect_command(args)?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // RUST_LOG directives refine the flag level, they don't replace it
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<ProfilerConfig> {
    let mut config = match &cli.config {
        Some(path) => ProfilerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProfilerConfig::default(),
    };

    if let Some(ms) = cli.interval {
        config = config.with_sample_interval_ms(ms);
    }
    if let Some(ms) = cli.cpu_window {
        config = config.with_cpu_window_ms(ms);
    }
    if let Some(ms) = cli.playback_interval {
        config = config.with_playback_interval_ms(ms);
    }
    if let Some(capacity) = cli.window_capacity {
        config = config.with_live_window_capacity(capacity);
    }

    config.validate()?;
    Ok(config)
}

async fn record_command(config: ProfilerConfig, args: &RecordArgs) -> anyhow::Result<()> {
    let duration = record_duration(args.duration)?;
    let collector = SystemCollector::new()?;
    if !collector.has_gpu() {
        println!("GPU metrics unavailable; GPU and VRAM will read 0");
    }
    let (mut engine, events) = ProfilerEngine::new(collector, config)?;

    let mut workload = match &args.program {
        Some(program) => Some(Workload::launch(program, &args.args)?),
        None => None,
    };

    engine.start_recording()?;
    println!("● REC  (Ctrl-C to stop)");

    let deadline = match duration {
        Some(duration) => Some(
            Instant::now()
                .checked_add(duration)
                .with_context(|| format!("Duration of {:?} is too long", duration))?,
        ),
        None => None,
    };
    let mut events = events.into_stream();

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(EngineEvent::Sample { sample, .. }) => print_sample(&sample),
                Some(EngineEvent::RecordingFailed { reason, samples }) => {
                    error!("Recording stopped after {} samples: {}", samples, reason);
                    break;
                }
                Some(_) => {}
                None => break,
            },
            status = wait_for_workload(&mut workload) => {
                match status {
                    Ok(status) => info!("Workload exited: {}", status),
                    Err(err) => warn!("Lost track of workload: {}", err),
                }
                break;
            }
            _ = sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    engine.stop_recording();
    if let Some(workload) = workload.as_mut() {
        workload.terminate().await?;
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(engine.default_export_name()));
    match engine.export_csv(&path) {
        Ok(rows) => println!("Benchmark data exported to {} ({} samples)", path.display(), rows),
        Err(err) if err.is_empty_data() => println!("No performance data to export"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

async fn replay_command(config: ProfilerConfig, args: &ReplayArgs) -> anyhow::Result<()> {
    let collector = SystemCollector::new()?;
    let (mut engine, events) = ProfilerEngine::new(collector, config)?;

    let loaded = match engine.load(&args.file) {
        Ok(loaded) => loaded,
        Err(err) if err.is_empty_data() => {
            println!("No valid data found in {}", args.file.display());
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to load {}", args.file.display()))
        }
    };
    println!("Loaded {} data points for replay", loaded);

    engine.start_replay()?;
    let mut events = events.into_stream();

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(EngineEvent::Sample { sample, .. }) => print_sample(&sample),
                Some(EngineEvent::ReplayCompleted { emitted }) => {
                    println!("Replay completed ({} samples)", emitted);
                    break;
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                engine.stop_replay();
                println!("Replay stopped at {}/{}", engine.replay_cursor(), engine.replay_len());
                break;
            }
        }
    }

    Ok(())
}

fn inspect_command(args: &InspectArgs) -> anyhow::Result<()> {
    let samples = csv::read_file(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let summary = SessionSummary::from_samples(&samples);

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
        "pretty" => print_pretty_summary(&args.file, &summary),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

/// Validate `--duration`; negative values mean "stop right away".
fn record_duration(secs: Option<f64>) -> anyhow::Result<Option<Duration>> {
    secs.map(|secs| {
        Duration::try_from_secs_f64(secs.max(0.0))
            .with_context(|| format!("Invalid recording duration: {}", secs))
    })
    .transpose()
}

async fn wait_for_workload(workload: &mut Option<Workload>) -> session_profiler::Result<ExitStatus> {
    match workload {
        Some(workload) => workload.wait().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn print_sample(sample: &Sample) {
    println!(
        "[{:>7.1}s] CPU {:>5.1}% | RAM {:>6.2} GB | GPU {:>5.1}% | VRAM {:>5.2} GB | Est. FPS {:>4.1}",
        sample.elapsed_seconds,
        sample.cpu_percent,
        sample.ram_gb,
        sample.gpu_percent,
        sample.vram_gb,
        sample.fps_estimate
    );
}

fn print_pretty_summary(file: &std::path::Path, summary: &SessionSummary) {
    println!("Session {}", file.display());
    println!("==========================================");
    println!("  Samples:  {}", summary.samples);
    println!("  Duration: {:.1} s", summary.duration_seconds);
    println!();
    println!("  {:<10} {:>10} {:>10} {:>10}", "channel", "min", "max", "mean");
    let rows = [
        ("CPU %", &summary.cpu_percent),
        ("RAM GB", &summary.ram_gb),
        ("GPU %", &summary.gpu_percent),
        ("VRAM GB", &summary.vram_gb),
        ("Est. FPS", &summary.fps_estimate),
    ];
    for (name, stats) in rows {
        println!(
            "  {:<10} {:>10.2} {:>10.2} {:>10.2}",
            name, stats.min, stats.max, stats.mean
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["session_profiler", "--interval", "250", "inspect", "run.csv"])
            .unwrap();
        assert_eq!(cli.interval, Some(250));
        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.file, PathBuf::from("run.csv"));
                assert_eq!(args.format, "pretty");
            }
            _ => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_record_with_workload_args() {
        let cli = Cli::try_parse_from([
            "session_profiler",
            "record",
            "--duration",
            "10",
            "./build/Release/SurroundView3D",
            "--",
            "--fullscreen",
            "-w",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Record(args) => {
                assert_eq!(args.duration, Some(10.0));
                assert_eq!(
                    args.program,
                    Some(PathBuf::from("./build/Release/SurroundView3D"))
                );
                assert_eq!(args.args, vec!["--fullscreen", "-w", "2"]);
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn test_default_config() {
        let cli = Cli::try_parse_from(["session_profiler", "record"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.sample_interval_ms, DEFAULT_SAMPLE_INTERVAL_MS);
        assert_eq!(config.cpu_window_ms, DEFAULT_CPU_WINDOW_MS);
        assert_eq!(config.playback_interval_ms, DEFAULT_PLAYBACK_INTERVAL_MS);
        assert_eq!(config.live_window_capacity, DEFAULT_LIVE_WINDOW_CAPACITY);
    }

    #[test]
    fn test_record_duration() {
        assert_eq!(record_duration(None).unwrap(), None);
        assert_eq!(
            record_duration(Some(1.5)).unwrap(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(record_duration(Some(-3.0)).unwrap(), Some(Duration::ZERO));
        assert!(record_duration(Some(f64::INFINITY)).is_err());
        assert!(record_duration(Some(1e30)).is_err());
    }

    #[test]
    fn test_debug_flag_enables_debug_logging() {
        std::env::remove_var("RUST_LOG");
        let cli = Cli::try_parse_from(["session_profiler", "--debug", "inspect", "run.csv"]).unwrap();
        init_logging(&cli).unwrap();

        assert!(tracing::enabled!(Level::DEBUG));
        assert!(tracing::enabled!(Level::INFO));
        assert!(!tracing::enabled!(Level::TRACE));
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let cli = Cli::try_parse_from(["session_profiler", "--interval", "50", "record"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
