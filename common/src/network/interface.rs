use std::fmt;
use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use tracing::debug;

/// The self-assigned IPv4 block (169.254.0.0/16) in CIDR notation.
pub const LINK_LOCAL_CIDR: &str = "169.254.0.0/16";

/// A local interface holding a link-local IPv4 address.
///
/// Interfaces with several link-local addresses show up once per address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interface {
    pub name: String,
    pub local_addr: Ipv4Addr,
}

impl Interface {
    pub fn new(name: impl Into<String>, local_addr: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            local_addr,
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.local_addr)
    }
}

pub fn is_link_local(addr: Ipv4Addr) -> bool {
    addr.is_link_local()
}

/// Lists the host's interfaces carrying a link-local IPv4 address.
///
/// An empty result is not an error; deciding what to do about it is up to the caller.
pub fn list_link_local_interfaces() -> Vec<Interface> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    debug!("Inspecting {} network interface(s)", interfaces.len());
    select_link_local(&interfaces)
}

fn select_link_local(interfaces: &[NetworkInterface]) -> Vec<Interface> {
    interfaces
        .iter()
        .filter(|intf| intf.is_up() && !intf.is_loopback())
        .flat_map(|intf| {
            intf.ips.iter().filter_map(move |net| match net {
                IpNetwork::V4(v4) if is_link_local(v4.ip()) => {
                    Some(Interface::new(intf.name.clone(), v4.ip()))
                }
                _ => None,
            })
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
