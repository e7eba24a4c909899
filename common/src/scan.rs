use std::fmt;
use std::net::Ipv4Addr;

use crate::device::SysInfo;
use crate::error::ScanError;

/// Outcome of probing a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// No answer to the ICMP echo.
    Unreachable,
    /// Alive, but the session port refused or timed out.
    PortClosed,
    Reachable,
}

/// The one value a scan hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Success { device_addr: Ipv4Addr, sys_info: SysInfo },
    Failure { reason: String },
}

impl ScanResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        ScanResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanResult::Success { .. })
    }
}

impl From<ScanError> for ScanResult {
    fn from(err: ScanError) -> Self {
        ScanResult::failure(err.to_string())
    }
}

/// Username and password for the password-based session tier.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
