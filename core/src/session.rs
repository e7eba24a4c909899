//! # Session Establisher
//!
//! Runs the diagnostic command on a candidate and validates what comes back.
//!
//! Two tiers, strictly one after the other:
//! 1. **Public key**: no credential leaves the host. Any failure here, including a
//!    malformed payload, falls through to the next tier.
//! 2. **Password**: the factory-default path for devices that do not trust a
//!    local key yet. Failures here are final.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use linkr_common::device::SysInfo;
use linkr_common::error::ScanError;
use linkr_common::scan::Credentials;

use crate::ports::{AuthMethod, SessionRequest, SessionTool, SessionToolError};

pub struct SessionEstablisher {
    tool: Box<dyn SessionTool>,
    port: u16,
    command: String,
}

impl SessionEstablisher {
    pub fn new(tool: Box<dyn SessionTool>, port: u16, command: impl Into<String>) -> Self {
        Self {
            tool,
            port,
            command: command.into(),
        }
    }

    pub async fn connect(&self, addr: Ipv4Addr, credentials: &Credentials) -> Result<SysInfo, ScanError> {
        let key_request = self.request(addr, credentials, AuthMethod::PublicKey);
        match self.tool.execute(&key_request).await {
            Ok(output) => match SysInfo::parse(&output) {
                Ok(sys_info) => {
                    info!("{addr} accepted the local key");
                    return Ok(sys_info);
                }
                Err(e) => debug!("Untrusted payload over key auth from {addr}: {e}"),
            },
            Err(SessionToolError::ToolMissing(tool)) => return Err(ScanError::ToolMissing(tool)),
            Err(SessionToolError::Transport(detail)) => {
                debug!("Key auth to {addr} failed: {detail}");
            }
        }

        let password_request =
            self.request(addr, credentials, AuthMethod::Password(&credentials.password));
        let output: String = match self.tool.execute(&password_request).await {
            Ok(output) => output,
            Err(SessionToolError::ToolMissing(tool)) => return Err(ScanError::ToolMissing(tool)),
            Err(SessionToolError::Transport(detail)) => {
                debug!("Password auth to {addr} failed: {detail}");
                return Err(ScanError::AuthenticationFailed);
            }
        };

        let sys_info = SysInfo::parse(&output).map_err(|e| ScanError::PayloadInvalid(e.to_string()))?;
        info!("{addr} accepted password auth as {}", credentials.username);
        Ok(sys_info)
    }

    fn request<'a>(
        &'a self,
        addr: Ipv4Addr,
        credentials: &'a Credentials,
        auth: AuthMethod<'a>,
    ) -> SessionRequest<'a> {
        SessionRequest {
            addr,
            port: self.port,
            username: &credentials.username,
            auth,
            command: &self.command,
        }
    }
}
