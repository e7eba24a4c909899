//! # Address-Resolution Refresher
//!
//! Sweeps the link-local block on one interface and pins every neighbor it sees
//! as a **static** entry in the local address-resolution table.
//!
//! Some instruments do not answer address-resolution queries on demand, so without
//! the static entry later probes and sessions silently go nowhere.
//!
//! The table mutation runs as a single privileged script per interface. A failing
//! entry prints a marker line on stdout instead of aborting the script; the marked
//! addresses are logged and dropped from the result. `osascript` drops stderr of a
//! successful script, so stdout is the only stream every channel keeps.

use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use tracing::{debug, info, warn};

use linkr_common::error::ScanError;
use linkr_common::network::candidate::{Candidate, CandidateSet};
use linkr_common::network::interface::{Interface, is_link_local};

use crate::ports::{PrivilegeChannel, PrivilegedOutput, SweepTool};
use crate::system::shell_quote;

const FAILURE_MARKER: &str = "refresh-failed";

/// Flavor of the neighbor table commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborTable {
    /// `ip neigh` (Linux).
    IpNeigh,
    /// `arp` with `ifscope` (macOS).
    Arp,
}

impl NeighborTable {
    pub fn native() -> Self {
        if cfg!(target_os = "macos") {
            NeighborTable::Arp
        } else {
            NeighborTable::IpNeigh
        }
    }

    /// Builds the script that replaces the entries of all `candidates` on `intf`.
    pub fn script(&self, intf: &Interface, candidates: &CandidateSet) -> String {
        let dev = shell_quote(&intf.name);
        let mut script = String::new();
        for Candidate { addr, mac } in candidates.iter() {
            let (delete, install) = match self {
                NeighborTable::IpNeigh => (
                    format!("ip neigh del {addr} dev {dev}"),
                    format!("ip neigh replace {addr} lladdr {mac} dev {dev} nud permanent"),
                ),
                NeighborTable::Arp => (
                    format!("arp -d {addr} ifscope {dev}"),
                    format!("arp -s {addr} {mac} ifscope {dev}"),
                ),
            };
            script.push_str(&format!("{delete} >/dev/null 2>&1\n"));
            script.push_str(&format!("{install} || echo \"{FAILURE_MARKER} {addr}\"\n"));
        }
        script.push_str("exit 0\n");
        script
    }
}

pub struct Refresher {
    sweep: Box<dyn SweepTool>,
    privilege: Box<dyn PrivilegeChannel>,
    table: NeighborTable,
}

impl Refresher {
    pub fn new(
        sweep: Box<dyn SweepTool>,
        privilege: Box<dyn PrivilegeChannel>,
        table: NeighborTable,
    ) -> Self {
        Self {
            sweep,
            privilege,
            table,
        }
    }

    /// Discovers the neighbors of `intf` and pins them in the neighbor table.
    ///
    /// Candidates come back in the order they were first seen.
    pub async fn refresh(&self, intf: &Interface) -> Result<Vec<Candidate>, ScanError> {
        let output: String = self.sweep.sweep(intf).await?;
        let mut candidates: CandidateSet = parse_sweep(&output);

        if candidates.is_empty() {
            debug!("Sweep on {intf} found no neighbors");
            return Ok(Vec::new());
        }
        info!("Sweep on {intf} found {} neighbor(s)", candidates.len());

        let script: String = self.table.script(intf, &candidates);
        let result: PrivilegedOutput = match self.privilege.run(&script).await {
            Ok(result) => result,
            Err(ScanError::PrivilegeDenied) => {
                warn!("Privilege escalation declined, skipping {intf}");
                return Err(ScanError::PrivilegeDenied);
            }
            Err(e) => {
                warn!("Could not update neighbor table for {intf}: {e}");
                return Err(e);
            }
        };

        for addr in parse_failures(&result) {
            if candidates.remove(addr).is_some() {
                warn!("Could not pin {addr} on {intf}, skipping it");
            }
        }

        Ok(candidates.into_vec())
    }
}

/// Collects `address<TAB>mac` pairs, ignoring every line that is not one.
fn parse_sweep(output: &str) -> CandidateSet {
    let mut candidates = CandidateSet::new();
    for line in output.lines() {
        let Some((addr, mac)) = parse_sweep_line(line) else {
            continue;
        };
        if !is_link_local(addr) {
            debug!("Ignoring {addr}, not link-local");
            continue;
        }
        candidates.insert(addr, mac);
    }
    candidates
}

fn parse_sweep_line(line: &str) -> Option<(Ipv4Addr, MacAddr)> {
    let mut fields = line.split_whitespace();
    let addr: Ipv4Addr = fields.next()?.parse().ok()?;
    let mac: MacAddr = fields.next()?.parse().ok()?;
    Some((addr, mac))
}

/// Lines may end in `\r` when AppleScript rewrote them.
fn parse_failures(output: &PrivilegedOutput) -> Vec<Ipv4Addr> {
    output
        .stdout
        .split(['\n', '\r'])
        .chain(output.stderr.split(['\n', '\r']))
        .filter_map(|line| line.trim().strip_prefix(FAILURE_MARKER))
        .filter_map(|rest| rest.trim().parse().ok())
        .collect()
}
