//! The monitored workload process.
//!
//! The engine does not care how the workload runs; it only needs to know when
//! it is alive so recording can start and stop around it.

use crate::error::{ProfilerError, Result};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::info;

/// A launched workload process.
pub struct Workload {
    program: PathBuf,
    child: Child,
}

impl Workload {
    /// Resolve `program` (a path or a name on `PATH`) and spawn it.
    pub fn launch(program: impl AsRef<Path>, args: &[String]) -> Result<Self> {
        let program = resolve_program(program.as_ref())?;

        let child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProfilerError::workload_error(format!(
                    "Failed to launch {}: {}",
                    program.display(),
                    e
                ))
            })?;

        info!(
            "Launched {} (pid {})",
            program.display(),
            child.id().unwrap_or_default()
        );
        Ok(Self { program, child })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// OS process id, `None` once the process has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether the process is still running.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for the process to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// Kill the process if it is still running and reap it.
    pub async fn terminate(&mut self) -> Result<()> {
        if !self.is_alive() {
            return Ok(());
        }
        self.child.kill().await.map_err(|e| {
            ProfilerError::workload_error(format!(
                "Failed to terminate {}: {}",
                self.program.display(),
                e
            ))
        })?;
        info!("Terminated {}", self.program.display());
        Ok(())
    }
}

fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(ProfilerError::workload_error(format!(
            "{} not found",
            program.display()
        )));
    }
    which::which(program)
        .map_err(|_| ProfilerError::workload_error(format!("{} not found", program.display())))
}
