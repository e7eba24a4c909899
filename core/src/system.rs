//! Adapters that implement the [`crate::ports`] on top of the host's own tools.

mod arp_scan;
mod interfaces;
mod keys;
mod ping;
mod privilege;
mod process;
mod ssh;

pub use arp_scan::ArpScan;
pub use interfaces::SystemInterfaces;
pub use keys::SshKeygen;
pub use ping::SystemPing;
pub use privilege::SystemPrivilege;
pub use ssh::OpenSsh;

use linkr_common::config::Config;

use crate::prober::ReachabilityProber;
use crate::scanner::Toolkit;
use crate::vendors::MacOuiRepo;

/// Assembles the production adapters for `config`.
pub fn toolkit(config: &Config) -> Toolkit {
    let ping = SystemPing::new(&config.tools.ping, config.timeouts.ping);
    Toolkit {
        interfaces: Box::new(SystemInterfaces),
        sweep: Box::new(ArpScan::new(
            &config.tools.sweep,
            config.sweep_retries,
            config.timeouts.sweep,
        )),
        privilege: Box::new(SystemPrivilege::new(config.timeouts.privilege)),
        prober: Box::new(ReachabilityProber::new(
            Box::new(ping),
            config.session_port,
            config.timeouts.port,
        )),
        session: Box::new(OpenSsh::from_config(config)),
        keys: Box::new(SshKeygen::new(&config.tools.keygen, config.key_path.clone())),
        vendors: Box::new(MacOuiRepo),
    }
}

/// Wraps `value` in single quotes for `sh`.
pub(crate) fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
