//! Link-local instrument discovery.
//!
//! [`scanner::DeviceScanner`] walks every link-local interface, refreshes its
//! neighbor table, probes each neighbor and opens a session on the first one
//! that answers with a valid status payload. Everything that touches the host
//! goes through the traits in [`ports`]; [`system`] holds the real adapters.

pub mod network;
pub mod ports;
pub mod prober;
pub mod refresher;
pub mod scanner;
pub mod session;
pub mod system;
pub mod vendors;
