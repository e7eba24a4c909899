use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use linkr_common::error::ScanError;
use linkr_common::network::interface::{Interface, LINK_LOCAL_CIDR};

use super::process::{self, CommandOutput, RunError};
use crate::ports::SweepTool;

/// Phrases libpcap prints when it may not open the capture device.
const CAPTURE_DENIED: &[&str] = &[
    "Operation not permitted",
    "Permission denied",
    "You don't have permission",
];

const CAPTURE_REMEDY: &str =
    "arp-scan may not capture packets; run linkr as root or grant arp-scan cap_net_raw (setcap cap_net_raw+ep <path to arp-scan>)";

/// Sweeps the link-local block with `arp-scan`.
///
/// `arp-scan` needs raw socket access, so it has to run as root or carry the
/// matching capabilities. A refused capture is reported as a privilege failure
/// naming the remedy.
pub struct ArpScan {
    program: String,
    retries: u8,
    timeout: Duration,
}

impl ArpScan {
    pub fn new(program: &str, retries: u8, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            retries,
            timeout,
        }
    }

    fn args(&self, intf: &Interface) -> Vec<String> {
        vec![
            format!("--interface={}", intf.name),
            "--quiet".into(),
            "--plain".into(),
            format!("--retry={}", self.retries),
            LINK_LOCAL_CIDR.into(),
        ]
    }
}

#[async_trait]
impl SweepTool for ArpScan {
    async fn sweep(&self, intf: &Interface) -> Result<String, ScanError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(intf));
        debug!("Sweeping {LINK_LOCAL_CIDR} on {intf}");

        let output: CommandOutput = match process::run(cmd, self.timeout).await {
            Ok(output) => output,
            Err(RunError::NotFound(program)) => return Err(ScanError::ToolMissing(program)),
            Err(e) => return Err(ScanError::SweepFailed(format!("{e:#}"))),
        };

        if !output.status.success() {
            return Err(sweep_failure(&output));
        }
        Ok(output.stdout)
    }
}

fn sweep_failure(output: &CommandOutput) -> ScanError {
    if CAPTURE_DENIED.iter().any(|phrase| output.stderr.contains(phrase)) {
        warn!("{}", output.stderr_summary());
        ScanError::PrivilegeFailed(CAPTURE_REMEDY.into())
    } else {
        ScanError::SweepFailed(output.stderr_summary())
    }
}
