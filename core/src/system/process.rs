use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::trace;

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// First non-empty line of stderr, for log messages.
    pub fn stderr_summary(&self) -> String {
        self.stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no error output")
            .to_string()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{program} timed out after {limit:?}")]
    TimedOut { program: String, limit: Duration },
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Runs `cmd` to completion with stdin closed, killing it once `limit` passes.
pub async fn run(mut cmd: Command, limit: Duration) -> Result<CommandOutput, RunError> {
    let program: String = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    trace!("Running {program}");
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(RunError::NotFound(program)),
        Err(e) => {
            return Err(RunError::Io(
                anyhow::Error::new(e).context(format!("spawning {program}")),
            ));
        }
    };

    match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(CommandOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(e)) => Err(RunError::Io(
            anyhow::Error::new(e).context(format!("waiting for {program}")),
        )),
        Err(_elapsed) => Err(RunError::TimedOut { program, limit }),
    }
}
