use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

/// A neighbor seen during a sweep that may be the instrument we are after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub addr: Ipv4Addr,
    pub mac: MacAddr,
}

impl Candidate {
    pub fn new(addr: Ipv4Addr, mac: MacAddr) -> Self {
        Self { addr, mac }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.addr, self.mac)
    }
}

/// Candidates of a single sweep, keyed by address.
///
/// Re-inserting an address replaces its MAC but keeps the position of the
/// first sighting, so iteration order is discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    order: Vec<Ipv4Addr>,
    macs: HashMap<Ipv4Addr, MacAddr>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting. Returns `true` when the address was not known yet.
    pub fn insert(&mut self, addr: Ipv4Addr, mac: MacAddr) -> bool {
        match self.macs.insert(addr, mac) {
            Some(_) => false,
            None => {
                self.order.push(addr);
                true
            }
        }
    }

    pub fn remove(&mut self, addr: Ipv4Addr) -> Option<Candidate> {
        let mac = self.macs.remove(&addr)?;
        self.order.retain(|known| *known != addr);
        Some(Candidate::new(addr, mac))
    }

    pub fn get(&self, addr: Ipv4Addr) -> Option<Candidate> {
        self.macs.get(&addr).map(|mac| Candidate::new(addr, *mac))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.order
            .iter()
            .filter_map(|addr| self.macs.get(addr).map(|mac| Candidate::new(*addr, *mac)))
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.iter().collect()
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        let mut set = CandidateSet::new();
        for candidate in iter {
            set.insert(candidate.addr, candidate.mac);
        }
        set
    }
}
