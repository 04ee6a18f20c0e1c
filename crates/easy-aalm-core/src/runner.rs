//! Process execution for the AALM binary.
//!
//! [`ModelRunner`] is the seam between the pipeline and the operating
//! system; [`SubprocessRunner`] is the production implementation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{AalmError, Result};

/// Everything needed to launch one simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Absolute path of the executable.
    pub executable: PathBuf,

    /// Directory the process runs in (the executable's own directory).
    pub working_dir: PathBuf,

    /// Input file name, relative to `working_dir`.
    pub input_file_name: String,

    /// Wall-clock limit.
    pub timeout: Duration,
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Backend that executes an [`Invocation`].
///
/// Implementations return `Ok` for any process that ran to completion,
/// whatever its exit code; interpreting the exit code is the caller's job.
#[async_trait]
pub trait ModelRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;

    fn name(&self) -> &str;
}

/// Runs the executable as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessRunner;

#[async_trait]
impl ModelRunner for SubprocessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let start = Instant::now();

        debug!(
            executable = %invocation.executable.display(),
            cwd = %invocation.working_dir.display(),
            input = %invocation.input_file_name,
            "spawning AALM"
        );

        let child = Command::new(&invocation.executable)
            .arg(&invocation.input_file_name)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AalmError::Spawn {
                path: invocation.executable.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| AalmError::Timeout {
                limit_ms: invocation.timeout.as_millis() as u64,
            })??;

        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        "subprocess"
    }
}
