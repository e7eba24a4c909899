use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use linkr_common::error::ScanError;

use super::process::{self, CommandOutput, RunError};
use crate::ports::{PrivilegeChannel, PrivilegedOutput};

/// pkexec: the operator dismissed the authentication dialog.
const PKEXEC_DISMISSED: i32 = 126;
/// pkexec: not authorized, or no authorization could be obtained.
const PKEXEC_NOT_AUTHORIZED: i32 = 127;
/// AppleScript error number for a cancelled prompt.
const OSASCRIPT_CANCELED: &str = "-128";

/// Runs scripts as root, asking the operator through the desktop when needed.
///
/// * already root: `sh -c`
/// * Linux: `pkexec sh -c`
/// * macOS: `osascript` with administrator privileges
pub struct SystemPrivilege {
    timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    None,
    Pkexec,
    Osascript,
}

impl SystemPrivilege {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn escalation() -> Escalation {
        if is_root::is_root() {
            Escalation::None
        } else if cfg!(target_os = "macos") {
            Escalation::Osascript
        } else {
            Escalation::Pkexec
        }
    }
}

#[async_trait]
impl PrivilegeChannel for SystemPrivilege {
    async fn run(&self, script: &str) -> Result<PrivilegedOutput, ScanError> {
        let escalation = Self::escalation();
        debug!("Running privileged script via {escalation:?}");

        let output: CommandOutput = match process::run(command(escalation, script), self.timeout).await {
            Ok(output) => output,
            Err(RunError::TimedOut { .. }) => {
                return Err(ScanError::PrivilegeFailed("no answer to the privilege prompt".into()));
            }
            Err(e) => return Err(ScanError::PrivilegeFailed(format!("{e:#}"))),
        };

        if output.status.success() {
            return Ok(PrivilegedOutput {
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        if is_declined(escalation, &output) {
            Err(ScanError::PrivilegeDenied)
        } else {
            Err(ScanError::PrivilegeFailed(output.stderr_summary()))
        }
    }
}

fn command(escalation: Escalation, script: &str) -> Command {
    match escalation {
        Escalation::None => {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", script]);
            cmd
        }
        Escalation::Pkexec => {
            let mut cmd = Command::new("pkexec");
            cmd.args(["sh", "-c", script]);
            cmd
        }
        Escalation::Osascript => {
            let mut cmd = Command::new("osascript");
            cmd.args(["-e", &apple_script(script)]);
            cmd
        }
    }
}

fn apple_script(script: &str) -> String {
    let escaped = script.replace('\\', "\\\\").replace('"', "\\\"");
    format!("do shell script \"{escaped}\" with administrator privileges without altering line endings")
}

fn is_declined(escalation: Escalation, output: &CommandOutput) -> bool {
    match escalation {
        Escalation::None => false,
        Escalation::Pkexec => match output.status.code() {
            Some(PKEXEC_DISMISSED) => true,
            Some(PKEXEC_NOT_AUTHORIZED) => output.stderr.contains("Not authorized"),
            _ => false,
        },
        Escalation::Osascript => {
            output.stderr.contains(OSASCRIPT_CANCELED) || output.stderr.contains("User canceled")
        }
    }
}
