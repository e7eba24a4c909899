use std::path::PathBuf;
use std::time::Duration;

use crate::scan::Credentials;

/// Factory default account of the instruments.
pub const DEFAULT_USERNAME: &str = "cwuser";
pub const DEFAULT_PASSWORD: &str = "fnet99";
/// Prints the instrument status as JSON.
pub const DEFAULT_DIAGNOSTIC_COMMAND: &str = "sysinfo";
pub const DEFAULT_SESSION_PORT: u16 = 22;

/// Everything a scan needs to know up front.
#[derive(Debug, Clone)]
pub struct Config {
    /// Used by the password tier only.
    pub credentials: Credentials,
    pub session_port: u16,
    /// Executed inside a login shell on the instrument.
    pub diagnostic_command: String,
    /// Private key of the key tier; the public half lives next to it as `.pub`.
    pub key_path: PathBuf,
    /// How often `arp-scan` retries each address.
    pub sweep_retries: u8,
    pub tools: ToolNames,
    pub timeouts: Timeouts,
}

/// Names (or paths) of the external utilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    pub sweep: String,
    pub ssh: String,
    pub sshpass: String,
    pub ping: String,
    pub keygen: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub ping: Duration,
    pub port: Duration,
    /// Handed to ssh as `ConnectTimeout`.
    pub session_connect: Duration,
    /// Hard limit for a whole session attempt.
    pub session: Duration,
    pub sweep: Duration,
    /// Includes the time the operator needs to answer the prompt.
    pub privilege: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::new(DEFAULT_USERNAME, DEFAULT_PASSWORD),
            session_port: DEFAULT_SESSION_PORT,
            diagnostic_command: DEFAULT_DIAGNOSTIC_COMMAND.to_string(),
            key_path: default_key_path(),
            sweep_retries: 2,
            tools: ToolNames::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            sweep: "arp-scan".into(),
            ssh: "ssh".into(),
            sshpass: "sshpass".into(),
            ping: "ping".into(),
            keygen: "ssh-keygen".into(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ping: Duration::from_secs(1),
            port: Duration::from_secs(1),
            session_connect: Duration::from_secs(5),
            session: Duration::from_secs(20),
            sweep: Duration::from_secs(60),
            privilege: Duration::from_secs(120),
        }
    }
}

/// `~/.ssh/id_rsa`, relative to the working directory when there is no home.
pub fn default_key_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
        .join("id_rsa")
}
