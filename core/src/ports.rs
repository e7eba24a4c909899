//! # Outbound Ports
//!
//! Contracts for everything the scan engine needs from the outside world.
//!
//! The engine only ever talks to these traits. Production implementations live
//! in [`crate::system`] and [`crate::vendors`]; tests plug in fakes.
//!
//! ## Rules
//! 1. All items here are traits or the plain values passed through them.
//! 2. Implementations must bound every call with a timeout.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use pnet::util::MacAddr;
use thiserror::Error;

use linkr_common::error::ScanError;
use linkr_common::network::candidate::Candidate;
use linkr_common::network::interface::Interface;
use linkr_common::scan::ProbeOutcome;

/// Source of the interfaces to scan.
pub trait InterfaceSource: Send + Sync {
    fn link_local_interfaces(&self) -> Vec<Interface>;
}

/// Address-resolution sweep of the link-local block on one interface.
#[async_trait]
pub trait SweepTool: Send + Sync {
    /// Returns the raw output of the sweep, one `address<TAB>mac` pair per line.
    ///
    /// Fails with [`ScanError::ToolMissing`] when the utility is not installed and
    /// with [`ScanError::SweepFailed`] for anything else.
    async fn sweep(&self, intf: &Interface) -> Result<String, ScanError>;
}

/// What a privileged script printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a shell script with elevated rights.
#[async_trait]
pub trait PrivilegeChannel: Send + Sync {
    /// Fails with [`ScanError::PrivilegeDenied`] when the operator declines and with
    /// [`ScanError::PrivilegeFailed`] when escalation breaks for any other reason.
    async fn run(&self, script: &str) -> Result<PrivilegedOutput, ScanError>;
}

/// ICMP echo sourced from a given local interface.
#[async_trait]
pub trait PingTool: Send + Sync {
    /// `Ok(false)` for a miss, `Err` when the echo could not be attempted at all.
    async fn echo(&self, target: Ipv4Addr, source: &Interface) -> anyhow::Result<bool>;
}

/// Decides whether a candidate is worth a session attempt.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, candidate: &Candidate, intf: &Interface) -> ProbeOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod<'a> {
    /// Local key pair only, password prompts disabled.
    PublicKey,
    /// Password only, public keys disabled.
    Password(&'a str),
}

/// One remote command execution.
#[derive(Debug, Clone, Copy)]
pub struct SessionRequest<'a> {
    pub addr: Ipv4Addr,
    pub port: u16,
    pub username: &'a str,
    pub auth: AuthMethod<'a>,
    pub command: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionToolError {
    #[error("{0} not found")]
    ToolMissing(String),
    /// Connection, host or authentication failure.
    #[error("session failed: {0}")]
    Transport(String),
}

/// Secure remote command execution with host-key checking disabled.
#[async_trait]
pub trait SessionTool: Send + Sync {
    /// Returns the standard output of the remote command.
    async fn execute(&self, request: &SessionRequest<'_>) -> Result<String, SessionToolError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Existing,
    Generated,
}

/// Local key pair used by the key-based session tier.
#[async_trait]
pub trait KeyProvisioner: Send + Sync {
    /// Generates the key pair unless it already exists.
    async fn ensure_key_pair(&self) -> anyhow::Result<KeyStatus>;

    /// Text of the public key, for enrollment on a device.
    async fn public_key(&self) -> anyhow::Result<String>;
}

/// Defines the contract for resolving device manufacturers from MAC addresses.
pub trait VendorRepository: Send + Sync {
    /// Retrieves the vendor name for a given MAC address.
    ///
    /// # Returns
    /// * `Some(String)` - The name of the vendor if found.
    /// * `None` - If the OUI is unknown.
    fn get_vendor(&self, mac_addr: MacAddr) -> Option<String>;
}
