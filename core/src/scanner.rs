//! # Scan Orchestrator
//!
//! Drives one scan from interface enumeration to the first working device:
//!
//! ```text
//! Init → EnumeratingInterfaces → per interface: Refreshing
//!      → per candidate: Probing → Authenticating → Succeeded | Exhausted
//! ```
//!
//! The walk is sequential on purpose. The refresh step rewrites the shared neighbor
//! table and the session step touches shared ssh state, so neither may run
//! concurrently with anything else in the same scan.
//!
//! Every loop level returns a [`Flow`]; the first [`Flow::Stop`] travels straight
//! up and ends the scan. Per-interface and per-candidate failures are recorded as
//! diagnostics and only show up in the final reason when nothing was found.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Instrument, debug, info, info_span, warn};

use linkr_common::config::Config;
use linkr_common::error::ScanError;
use linkr_common::network::candidate::Candidate;
use linkr_common::network::interface::Interface;
use linkr_common::scan::{Credentials, ProbeOutcome, ScanResult};

use crate::ports::{
    InterfaceSource, KeyProvisioner, KeyStatus, PrivilegeChannel, Prober, SessionTool, SweepTool,
    VendorRepository,
};
use crate::refresher::{NeighborTable, Refresher};
use crate::session::SessionEstablisher;

/// Outcome of one loop level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop(ScanResult),
}

/// What the scan is currently doing, for progress displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStage {
    Refreshing(Interface),
    Probing(Candidate),
    Authenticating(Candidate),
}

pub type ProgressCallback = Box<dyn Fn(&ScanStage) + Send + Sync>;

/// Cancels a scan at the next interface or candidate boundary.
#[derive(Debug, Clone, Default)]
pub struct ScanCancel(Arc<AtomicBool>);

impl ScanCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The external capabilities a scan is assembled from.
pub struct Toolkit {
    pub interfaces: Box<dyn InterfaceSource>,
    pub sweep: Box<dyn SweepTool>,
    pub privilege: Box<dyn PrivilegeChannel>,
    /// Usually a [`crate::prober::ReachabilityProber`].
    pub prober: Box<dyn Prober>,
    pub session: Box<dyn SessionTool>,
    pub keys: Box<dyn KeyProvisioner>,
    pub vendors: Box<dyn VendorRepository>,
}

pub struct DeviceScanner {
    interfaces: Box<dyn InterfaceSource>,
    refresher: Refresher,
    prober: Box<dyn Prober>,
    establisher: SessionEstablisher,
    keys: Box<dyn KeyProvisioner>,
    vendors: Box<dyn VendorRepository>,
    cancel: ScanCancel,
    on_progress: Option<ProgressCallback>,
}

impl DeviceScanner {
    pub fn new(config: &Config, toolkit: Toolkit) -> Self {
        Self {
            interfaces: toolkit.interfaces,
            refresher: Refresher::new(toolkit.sweep, toolkit.privilege, NeighborTable::native()),
            prober: toolkit.prober,
            establisher: SessionEstablisher::new(
                toolkit.session,
                config.session_port,
                config.diagnostic_command.clone(),
            ),
            keys: toolkit.keys,
            vendors: toolkit.vendors,
            cancel: ScanCancel::new(),
            on_progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: ScanCancel) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Runs one full scan and returns the first device that answered with a valid
    /// status payload, or a single reason why none did.
    pub async fn scan_for_device(&self, credentials: &Credentials) -> ScanResult {
        let mut diagnostics: Vec<String> = Vec::new();
        match self.run(credentials, &mut diagnostics).await {
            Flow::Stop(result) => result,
            Flow::Continue => {
                warn!("Every interface and candidate was tried without success");
                ScanError::Exhausted(diagnostics).into()
            }
        }
    }

    async fn run(&self, credentials: &Credentials, diagnostics: &mut Vec<String>) -> Flow {
        self.ensure_key_pair().await;

        if self.cancel.is_cancelled() {
            return Flow::Stop(ScanError::Cancelled.into());
        }

        let interfaces: Vec<Interface> = self.interfaces.link_local_interfaces();
        if interfaces.is_empty() {
            warn!("No interface holds a link-local address");
            return Flow::Stop(ScanError::NoInterfaceFound.into());
        }
        info!("Found {} link-local interface(s)", interfaces.len());

        for intf in &interfaces {
            let span = info_span!("interface", name = %intf.name);
            if let Flow::Stop(result) = self
                .scan_interface(intf, credentials, diagnostics)
                .instrument(span)
                .await
            {
                return Flow::Stop(result);
            }
        }
        Flow::Continue
    }

    async fn ensure_key_pair(&self) {
        match self.keys.ensure_key_pair().await {
            Ok(KeyStatus::Existing) => debug!("Local key pair present"),
            Ok(KeyStatus::Generated) => info!("Generated a new local key pair"),
            Err(e) => warn!("Could not provision a local key pair, key auth will fail: {e:#}"),
        }
    }

    async fn scan_interface(
        &self,
        intf: &Interface,
        credentials: &Credentials,
        diagnostics: &mut Vec<String>,
    ) -> Flow {
        if self.cancel.is_cancelled() {
            return Flow::Stop(ScanError::Cancelled.into());
        }
        self.report(ScanStage::Refreshing(intf.clone()));

        let candidates: Vec<Candidate> = match self.refresher.refresh(intf).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_fatal() => return Flow::Stop(e.into()),
            Err(e) => {
                diagnostics.push(format!("{}: {e}", intf.name));
                return Flow::Continue;
            }
        };

        if candidates.is_empty() {
            info!("No candidates on {intf}");
            diagnostics.push(format!("{}: no candidates", intf.name));
            return Flow::Continue;
        }

        for candidate in &candidates {
            let span = info_span!("candidate", addr = %candidate.addr);
            if let Flow::Stop(result) = self
                .try_candidate(intf, candidate, credentials, diagnostics)
                .instrument(span)
                .await
            {
                return Flow::Stop(result);
            }
        }
        Flow::Continue
    }

    async fn try_candidate(
        &self,
        intf: &Interface,
        candidate: &Candidate,
        credentials: &Credentials,
        diagnostics: &mut Vec<String>,
    ) -> Flow {
        if self.cancel.is_cancelled() {
            return Flow::Stop(ScanError::Cancelled.into());
        }

        match self.vendors.get_vendor(candidate.mac) {
            Some(vendor) => info!("Trying {candidate} ({vendor})"),
            None => info!("Trying {candidate}"),
        }

        self.report(ScanStage::Probing(*candidate));
        let skipped = match self.prober.probe(candidate, intf).await {
            ProbeOutcome::Reachable => None,
            ProbeOutcome::Unreachable => Some(ScanError::Unreachable),
            ProbeOutcome::PortClosed => Some(ScanError::PortClosed),
        };
        if let Some(reason) = skipped {
            debug!("Skipping {}: {reason}", candidate.addr);
            diagnostics.push(format!("{} on {}: {reason}", candidate.addr, intf.name));
            return Flow::Continue;
        }

        self.report(ScanStage::Authenticating(*candidate));
        match self.establisher.connect(candidate.addr, credentials).await {
            Ok(sys_info) => {
                info!("Found instrument {} at {}", sys_info.serial_number, candidate.addr);
                Flow::Stop(ScanResult::Success {
                    device_addr: candidate.addr,
                    sys_info,
                })
            }
            Err(e) if e.is_fatal() => Flow::Stop(e.into()),
            Err(e) => {
                match &e {
                    ScanError::PayloadInvalid(detail) => warn!("{} sent an invalid payload: {detail}", candidate.addr),
                    other => warn!("Session with {} failed: {other}", candidate.addr),
                }
                diagnostics.push(format!("{} on {}: {e}", candidate.addr, intf.name));
                Flow::Continue
            }
        }
    }

    fn report(&self, stage: ScanStage) {
        if let Some(callback) = &self.on_progress {
            callback(&stage);
        }
    }
}
