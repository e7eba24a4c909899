use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use linkr_common::config::Config;
use tokio::process::Command;
use tracing::trace;

use super::process::{self, CommandOutput, RunError};
use super::shell_quote;
use crate::ports::{AuthMethod, SessionRequest, SessionTool, SessionToolError};

/// Exit status ssh uses for its own errors.
const SSH_ERROR: i32 = 255;

/// Remote execution through the OpenSSH client, with `sshpass` for the password tier.
pub struct OpenSsh {
    ssh: String,
    sshpass: String,
    key_path: PathBuf,
    connect_timeout: Duration,
    timeout: Duration,
}

impl OpenSsh {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ssh: config.tools.ssh.clone(),
            sshpass: config.tools.sshpass.clone(),
            key_path: config.key_path.clone(),
            connect_timeout: config.timeouts.session_connect,
            timeout: config.timeouts.session,
        }
    }

    fn ssh_args(&self, request: &SessionRequest<'_>) -> Vec<String> {
        let mut args: Vec<String> = vec!["-p".into(), request.port.to_string()];
        let connect_timeout = format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1));
        let mut options: Vec<&str> = vec![
            "StrictHostKeyChecking=no",
            "UserKnownHostsFile=/dev/null",
            "LogLevel=ERROR",
            connect_timeout.as_str(),
        ];

        match request.auth {
            AuthMethod::PublicKey => {
                options.extend([
                    "BatchMode=yes",
                    "PasswordAuthentication=no",
                    "KbdInteractiveAuthentication=no",
                    "PreferredAuthentications=publickey",
                    "IdentitiesOnly=yes",
                ]);
                args.push("-i".into());
                args.push(self.key_path.to_string_lossy().into_owned());
            }
            AuthMethod::Password(_) => {
                options.extend([
                    "PubkeyAuthentication=no",
                    "PreferredAuthentications=password",
                    "NumberOfPasswordPrompts=1",
                ]);
            }
        }

        for option in options {
            args.push("-o".into());
            args.push(option.to_string());
        }

        args.push(format!("{}@{}", request.username, request.addr));
        args.push(format!("bash -lc {}", shell_quote(request.command)));
        args
    }

    fn command(&self, request: &SessionRequest<'_>) -> Command {
        match request.auth {
            AuthMethod::PublicKey => {
                let mut cmd = Command::new(&self.ssh);
                cmd.args(self.ssh_args(request));
                cmd
            }
            AuthMethod::Password(password) => {
                let mut cmd = Command::new(&self.sshpass);
                cmd.arg("-e").arg(&self.ssh).args(self.ssh_args(request));
                cmd.env("SSHPASS", password);
                cmd
            }
        }
    }
}

#[async_trait]
impl SessionTool for OpenSsh {
    async fn execute(&self, request: &SessionRequest<'_>) -> Result<String, SessionToolError> {
        trace!("Opening session to {}@{}", request.username, request.addr);
        let output: CommandOutput = match process::run(self.command(request), self.timeout).await {
            Ok(output) => output,
            Err(RunError::NotFound(program)) => return Err(SessionToolError::ToolMissing(program)),
            Err(e) => return Err(SessionToolError::Transport(format!("{e:#}"))),
        };
        classify(output)
    }
}

/// Tells session failures apart from remote commands that merely exited non-zero.
///
/// ssh reports its own failures with 255; sshpass uses small codes of its own but
/// never produces stdout in that case.
fn classify(output: CommandOutput) -> Result<String, SessionToolError> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    if output.status.code() == Some(SSH_ERROR) || output.stdout.trim().is_empty() {
        return Err(SessionToolError::Transport(output.stderr_summary()));
    }
    Ok(output.stdout)
}
