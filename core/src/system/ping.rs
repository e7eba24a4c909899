use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use linkr_common::network::interface::Interface;
use tokio::process::Command;

use super::process::{self, RunError};
use crate::ports::PingTool;

/// Grace period on top of ping's own deadline before the process is killed.
const KILL_MARGIN: Duration = Duration::from_secs(1);

/// One ICMP echo through the system `ping`, sourced from the interface address.
pub struct SystemPing {
    program: String,
    timeout: Duration,
}

impl SystemPing {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }

    fn args(&self, target: Ipv4Addr, source: Ipv4Addr) -> Vec<String> {
        let wait: String = self.timeout.as_secs().max(1).to_string();
        let (wait_flag, source_flag) = if cfg!(target_os = "macos") {
            ("-t", "-S")
        } else {
            ("-W", "-I")
        };
        vec![
            "-c".into(),
            "1".into(),
            wait_flag.into(),
            wait,
            source_flag.into(),
            source.to_string(),
            target.to_string(),
        ]
    }
}

#[async_trait]
impl PingTool for SystemPing {
    async fn echo(&self, target: Ipv4Addr, source: &Interface) -> anyhow::Result<bool> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(target, source.local_addr));

        match process::run(cmd, self.timeout + KILL_MARGIN).await {
            Ok(output) => Ok(output.status.success()),
            Err(RunError::TimedOut { .. }) => Ok(false),
            Err(RunError::NotFound(program)) => bail!("{program} not found"),
            Err(RunError::Io(e)) => Err(e),
        }
    }
}
