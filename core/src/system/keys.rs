use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::process::{self, RunError};
use crate::ports::{KeyProvisioner, KeyStatus};

/// 4096-bit RSA takes a moment on small machines.
const KEYGEN_TIMEOUT: Duration = Duration::from_secs(60);

/// Provisions the local RSA key pair with `ssh-keygen`.
pub struct SshKeygen {
    program: String,
    key_path: PathBuf,
}

impl SshKeygen {
    pub fn new(program: &str, key_path: PathBuf) -> Self {
        Self {
            program: program.to_string(),
            key_path,
        }
    }

    fn public_key_path(&self) -> PathBuf {
        let mut path: OsString = self.key_path.clone().into_os_string();
        path.push(".pub");
        PathBuf::from(path)
    }

    fn args(&self) -> Vec<OsString> {
        vec![
            "-t".into(),
            "rsa".into(),
            "-b".into(),
            "4096".into(),
            "-f".into(),
            self.key_path.clone().into_os_string(),
            "-N".into(),
            "".into(),
            "-q".into(),
        ]
    }
}

#[async_trait]
impl KeyProvisioner for SshKeygen {
    async fn ensure_key_pair(&self) -> anyhow::Result<KeyStatus> {
        if tokio::fs::try_exists(&self.key_path).await.unwrap_or(false) {
            debug!("Key pair present at {}", self.key_path.display());
            return Ok(KeyStatus::Existing);
        }

        if let Some(dir) = self.key_path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        let output = match process::run(cmd, KEYGEN_TIMEOUT).await {
            Ok(output) => output,
            Err(RunError::NotFound(program)) => bail!("{program} not found"),
            Err(e) => return Err(e.into()),
        };
        if !output.status.success() {
            bail!("{} failed: {}", self.program, output.stderr_summary());
        }

        info!("Generated key pair at {}", self.key_path.display());
        Ok(KeyStatus::Generated)
    }

    async fn public_key(&self) -> anyhow::Result<String> {
        let path = self.public_key_path();
        let key = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(key.trim().to_string())
    }
}
