#![cfg(test)]
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use linkr_common::config::Config;
use linkr_common::device::SysInfo;
use linkr_common::error::ScanError;
use linkr_common::network::interface::Interface;
use linkr_common::scan::{Credentials, ProbeOutcome, ScanResult};
use linkr_core::ports::{PingTool, PrivilegedOutput, SessionToolError};
use linkr_core::prober::ReachabilityProber;
use linkr_core::scanner::{DeviceScanner, ScanCancel, ScanStage};

use crate::fakes::{
    link_local, mac, payload, FakeInterfaces, FakePrivilege, FakeProber, FakeSession, FakeSweep,
    Harness, Tier,
};

fn eth(name: &str, c: u8) -> Interface {
    Interface::new(name, link_local(c, 1))
}

fn success(addr: Ipv4Addr, serial: &str) -> ScanResult {
    ScanResult::Success {
        device_addr: addr,
        sys_info: SysInfo {
            serial_number: serial.to_string(),
            model: None,
            software_versions: Vec::new(),
        },
    }
}

async fn run(harness: &Harness) -> ScanResult {
    let config = Config::default();
    harness.scanner(&config).scan_for_device(&config.credentials).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[tokio::test]
async fn key_auth_success_reports_device() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert_eq!(harness.session.tiers_for(device), vec![Tier::Key]);
    assert_eq!(harness.privilege.scripts().len(), 1);
}

#[tokio::test]
async fn serial_less_password_payload_exhausts_scan() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(
            device,
            Tier::Password,
            Ok(r#"{"instruments":[{}]}"#.to_string()),
        ),
        ..Harness::default()
    };

    let ScanResult::Failure { reason } = run(&harness).await else {
        panic!("a payload without serial must not be a device");
    };
    assert!(reason.starts_with("Exhausted"), "{reason}");
    assert!(reason.contains("169.254.1.2 on eth0: PayloadInvalid"), "{reason}");
    assert_eq!(harness.session.tiers_for(device), vec![Tier::Key, Tier::Password]);
}

#[tokio::test]
async fn unreachable_interface_is_skipped_without_auth() {
    let silent = link_local(1, 2);
    let device = link_local(2, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 1), eth("eth1", 2)]),
        sweep: FakeSweep::default()
            .neighbors("eth0", &[(silent, mac(2))])
            .neighbors("eth1", &[(device, mac(3))]),
        prober: FakeProber::default()
            .outcome(silent, ProbeOutcome::Unreachable)
            .outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(device, Tier::Key, Ok(payload("XYZ789"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "XYZ789"));
    assert!(harness.session.tiers_for(silent).is_empty());
    assert_eq!(
        harness.prober.calls(),
        vec![(silent, "eth0".to_string()), (device, "eth1".to_string())]
    );
}

#[tokio::test]
async fn first_success_stops_the_scan() {
    let first = link_local(1, 2);
    let second = link_local(1, 3);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0), eth("eth1", 9)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(first, mac(2)), (second, mac(3))]),
        prober: FakeProber::default()
            .outcome(first, ProbeOutcome::Reachable)
            .outcome(second, ProbeOutcome::Reachable),
        session: FakeSession::default()
            .answer(first, Tier::Key, Ok(payload("FIRST")))
            .answer(second, Tier::Key, Ok(payload("SECOND"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(first, "FIRST"));
    assert!(harness.session.tiers_for(second).is_empty());
    assert_eq!(harness.sweep.calls(), vec!["eth0"]);
}

#[tokio::test]
async fn no_interfaces_touch_nothing_privileged() {
    let harness = Harness::default();

    assert_eq!(run(&harness).await, ScanResult::failure("no link-local interface"));
    assert!(harness.sweep.calls().is_empty());
    assert!(harness.privilege.scripts().is_empty());
    assert!(harness.session.calls().is_empty());
}

#[tokio::test]
async fn empty_sweep_makes_no_privileged_call() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        ..Harness::default()
    };

    assert_eq!(
        run(&harness).await,
        ScanResult::failure("Exhausted: eth0: no candidates")
    );
    assert_eq!(harness.sweep.calls(), vec!["eth0"]);
    assert!(harness.privilege.scripts().is_empty());
}

#[tokio::test]
async fn closed_port_skips_session() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::PortClosed),
        ..Harness::default()
    };

    assert_eq!(
        run(&harness).await,
        ScanResult::failure("Exhausted: 169.254.1.2 on eth0: PortClosed")
    );
    assert!(harness.session.calls().is_empty());
}

#[tokio::test]
async fn key_tier_payload_without_serial_falls_back_to_password() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default()
            .answer(device, Tier::Key, Ok(r#"{"instruments":[{"model":"Versiv"}]}"#.into()))
            .answer(device, Tier::Password, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert_eq!(harness.session.tiers_for(device), vec![Tier::Key, Tier::Password]);
}

#[tokio::test]
async fn password_tier_uses_configured_account_and_command() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(device, Tier::Password, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    let mut config = Config::default();
    config.diagnostic_command = "status --json".into();
    let credentials = Credentials::new("service", "s3cret");
    let result = harness.scanner(&config).scan_for_device(&credentials).await;

    assert!(result.is_success());
    let calls = harness.session.calls();
    let password_call = calls
        .iter()
        .find(|call| call.tier == Tier::Password)
        .unwrap();
    assert_eq!(password_call.username, "service");
    assert_eq!(password_call.password.as_deref(), Some("s3cret"));
    assert_eq!(password_call.command, "status --json");
    assert!(calls.iter().all(|call| call.tier == Tier::Password || call.password.is_none()));
}

#[tokio::test]
async fn failed_authentication_moves_to_next_candidate() {
    let locked = link_local(1, 2);
    let device = link_local(1, 3);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(locked, mac(2)), (device, mac(3))]),
        prober: FakeProber::default()
            .outcome(locked, ProbeOutcome::Reachable)
            .outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(device, Tier::Password, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert_eq!(harness.session.tiers_for(locked), vec![Tier::Key, Tier::Password]);
}

#[tokio::test]
async fn missing_sweep_tool_ends_scan() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0), eth("eth1", 9)]),
        sweep: FakeSweep::default().fails("eth0", ScanError::ToolMissing("arp-scan".into())),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, ScanResult::failure("ToolMissing: arp-scan"));
    assert_eq!(harness.sweep.calls(), vec!["eth0"]);
}

#[tokio::test]
async fn missing_session_tool_ends_scan() {
    let first = link_local(1, 2);
    let second = link_local(1, 3);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(first, mac(2)), (second, mac(3))]),
        prober: FakeProber::default()
            .outcome(first, ProbeOutcome::Reachable)
            .outcome(second, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(
            first,
            Tier::Key,
            Err(SessionToolError::ToolMissing("ssh".into())),
        ),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, ScanResult::failure("ToolMissing: ssh"));
    assert!(harness.session.tiers_for(second).is_empty());
}

#[tokio::test]
async fn declined_privilege_continues_with_next_interface() {
    let blocked = link_local(1, 2);
    let device = link_local(2, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 1), eth("eth1", 2)]),
        sweep: FakeSweep::default()
            .neighbors("eth0", &[(blocked, mac(2))])
            .neighbors("eth1", &[(device, mac(3))]),
        privilege: FakePrivilege::default().answer_next(Err(ScanError::PrivilegeDenied)),
        prober: FakeProber::default()
            .outcome(blocked, ProbeOutcome::Reachable)
            .outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default()
            .answer(blocked, Tier::Key, Ok(payload("BLOCKED")))
            .answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert_eq!(harness.privilege.scripts().len(), 2);
    assert!(harness.prober.calls().iter().all(|(addr, _)| *addr != blocked));
}

#[tokio::test]
async fn failed_sweep_continues_with_next_interface() {
    let device = link_local(2, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 1), eth("eth1", 2)]),
        sweep: FakeSweep::default()
            .fails("eth0", ScanError::SweepFailed("arp-scan timed out after 60s".into()))
            .neighbors("eth1", &[(device, mac(3))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert_eq!(harness.sweep.calls(), vec!["eth0", "eth1"]);
    assert_eq!(harness.privilege.scripts().len(), 1, "only eth1 is pinned");
}

#[tokio::test]
async fn failed_privilege_continues_with_next_interface() {
    let blocked = link_local(1, 2);
    let device = link_local(2, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 1), eth("eth1", 2)]),
        sweep: FakeSweep::default()
            .neighbors("eth0", &[(blocked, mac(2))])
            .neighbors("eth1", &[(device, mac(3))]),
        privilege: FakePrivilege::default().answer_next(Err(ScanError::PrivilegeFailed(
            "No authentication agent found.".into(),
        ))),
        prober: FakeProber::default()
            .outcome(blocked, ProbeOutcome::Reachable)
            .outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default()
            .answer(blocked, Tier::Key, Ok(payload("BLOCKED")))
            .answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert!(harness.prober.calls().iter().all(|(addr, _)| *addr != blocked));
}

#[tokio::test]
async fn per_interface_failures_are_listed_when_exhausted() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 1), eth("eth1", 2), eth("eth2", 3)]),
        sweep: FakeSweep::default()
            .fails("eth0", ScanError::SweepFailed("interface went down".into()))
            .fails("eth1", ScanError::PrivilegeFailed("run linkr as root".into()))
            .neighbors("eth2", &[(link_local(3, 2), mac(4))]),
        privilege: FakePrivilege::default().answer_next(Err(ScanError::PrivilegeFailed(
            "No authentication agent found.".into(),
        ))),
        ..Harness::default()
    };

    assert_eq!(
        run(&harness).await,
        ScanResult::failure(
            "Exhausted: eth0: sweep failed: interface went down; \
             eth1: privilege escalation failed: run linkr as root; \
             eth2: privilege escalation failed: No authentication agent found."
        )
    );
    assert_eq!(harness.sweep.calls(), vec!["eth0", "eth1", "eth2"]);
    assert!(harness.prober.calls().is_empty());
}

#[tokio::test]
async fn declined_privilege_is_reported_apart_from_no_candidates() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 1), eth("eth1", 2)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(link_local(1, 2), mac(2))]),
        privilege: FakePrivilege::default().answer_next(Err(ScanError::PrivilegeDenied)),
        ..Harness::default()
    };

    assert_eq!(
        run(&harness).await,
        ScanResult::failure(
            "Exhausted: eth0: privilege escalation declined; eth1: no candidates"
        )
    );
}

#[tokio::test]
async fn addresses_that_failed_to_pin_are_not_tried() {
    let unpinned = link_local(1, 2);
    let device = link_local(1, 3);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(unpinned, mac(2)), (device, mac(3))]),
        privilege: FakePrivilege::default().answer_next(Ok(PrivilegedOutput {
            stdout: String::new(),
            stderr: format!("refresh-failed {unpinned}\n"),
        })),
        prober: FakeProber::default()
            .outcome(unpinned, ProbeOutcome::Reachable)
            .outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default()
            .answer(unpinned, Tier::Key, Ok(payload("UNPINNED")))
            .answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    assert_eq!(run(&harness).await, success(device, "ABC123"));
    assert_eq!(harness.prober.calls(), vec![(device, "eth0".to_string())]);
}

#[tokio::test]
async fn refresh_pins_every_swept_neighbor() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default()
            .neighbors("eth0", &[(link_local(1, 2), mac(2)), (link_local(1, 3), mac(3))]),
        ..Harness::default()
    };

    run(&harness).await;
    let scripts = harness.privilege.scripts();
    assert_eq!(scripts.len(), 1, "one privileged call per interface");
    assert!(scripts[0].contains("169.254.1.2"));
    assert!(scripts[0].contains("169.254.1.3"));
}

#[tokio::test]
async fn key_pair_is_ensured_once_per_scan() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0), eth("eth1", 9)]),
        ..Harness::default()
    };

    run(&harness).await;
    assert_eq!(harness.keys.ensure_calls(), 1);
}

#[tokio::test]
async fn cancelled_before_start() {
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        ..Harness::default()
    };
    let cancel = ScanCancel::new();
    cancel.cancel();

    let config = Config::default();
    let result = harness
        .scanner(&config)
        .with_cancel(cancel)
        .scan_for_device(&config.credentials)
        .await;

    assert_eq!(result, ScanResult::failure("cancelled"));
    assert!(harness.sweep.calls().is_empty());
}

#[tokio::test]
async fn cancel_takes_effect_at_next_candidate() {
    let first = link_local(1, 2);
    let second = link_local(1, 3);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(first, mac(2)), (second, mac(3))]),
        ..Harness::default()
    };

    let cancel = ScanCancel::new();
    let trip = cancel.clone();
    let config = Config::default();
    let result = harness
        .scanner(&config)
        .with_cancel(cancel)
        .with_progress(Box::new(move |stage: &ScanStage| {
            if matches!(stage, ScanStage::Probing(_)) {
                trip.cancel();
            }
        }))
        .scan_for_device(&config.credentials)
        .await;

    assert_eq!(result, ScanResult::failure("cancelled"));
    assert_eq!(harness.prober.calls(), vec![(first, "eth0".to_string())]);
}

#[tokio::test]
async fn progress_reports_each_stage_in_order() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        prober: FakeProber::default().outcome(device, ProbeOutcome::Reachable),
        session: FakeSession::default().answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    let stages = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = stages.clone();
    let config = Config::default();
    harness
        .scanner(&config)
        .with_progress(Box::new(move |stage: &ScanStage| {
            let label = match stage {
                ScanStage::Refreshing(_) => "refreshing",
                ScanStage::Probing(_) => "probing",
                ScanStage::Authenticating(_) => "authenticating",
            };
            sink.lock().unwrap().push(label);
        }))
        .scan_for_device(&config.credentials)
        .await;

    assert_eq!(
        *stages.lock().unwrap(),
        vec!["refreshing", "probing", "authenticating"]
    );
}

struct SilentPing;

#[async_trait]
impl PingTool for SilentPing {
    async fn echo(&self, _target: Ipv4Addr, _source: &Interface) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn reachability_prober_gates_sessions() {
    let device = link_local(1, 2);
    let harness = Harness {
        interfaces: FakeInterfaces(vec![eth("eth0", 0)]),
        sweep: FakeSweep::default().neighbors("eth0", &[(device, mac(2))]),
        session: FakeSession::default().answer(device, Tier::Key, Ok(payload("ABC123"))),
        ..Harness::default()
    };

    let mut toolkit = harness.toolkit();
    toolkit.prober = Box::new(ReachabilityProber::new(
        Box::new(SilentPing),
        22,
        Duration::from_millis(100),
    ));
    let config = Config::default();
    let result = DeviceScanner::new(&config, toolkit)
        .scan_for_device(&config.credentials)
        .await;

    assert_eq!(
        result,
        ScanResult::failure("Exhausted: 169.254.1.2 on eth0: Unreachable")
    );
    assert!(harness.session.calls().is_empty());
}
