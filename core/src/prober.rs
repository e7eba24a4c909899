//! Two-step reachability check: ICMP echo from the interface's own address, then
//! a TCP handshake with the session port. No retries here, the scanner simply
//! moves on to the next candidate.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use linkr_common::network::candidate::Candidate;
use linkr_common::network::interface::Interface;
use linkr_common::scan::ProbeOutcome;

use crate::network::tcp;
use crate::ports::{PingTool, Prober};

pub struct ReachabilityProber {
    ping: Box<dyn PingTool>,
    port: u16,
    port_timeout: Duration,
}

impl ReachabilityProber {
    pub fn new(ping: Box<dyn PingTool>, port: u16, port_timeout: Duration) -> Self {
        Self {
            ping,
            port,
            port_timeout,
        }
    }
}

#[async_trait]
impl Prober for ReachabilityProber {
    async fn probe(&self, candidate: &Candidate, intf: &Interface) -> ProbeOutcome {
        match self.ping.echo(candidate.addr, intf).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("{} did not answer the echo from {}", candidate.addr, intf.local_addr);
                return ProbeOutcome::Unreachable;
            }
            Err(e) => {
                warn!("Echo to {} could not be sent: {e:#}", candidate.addr);
                return ProbeOutcome::Unreachable;
            }
        }

        let socket_addr = SocketAddr::new(IpAddr::V4(candidate.addr), self.port);
        if tcp::handshake_probe(socket_addr, self.port_timeout).await {
            ProbeOutcome::Reachable
        } else {
            debug!("{socket_addr} is alive but not accepting connections");
            ProbeOutcome::PortClosed
        }
    }
}
