use std::future;
use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use colored::*;
use tracing::{Instrument, warn};

use linkr_common::error::ScanError;
use linkr_common::scan::ScanResult;
use linkr_core::scanner::{DeviceScanner, ScanCancel};
use linkr_core::system;

use crate::commands::ScanArgs;
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn scan(args: ScanArgs) -> anyhow::Result<ExitCode> {
    let config = args.into_config();
    let credentials = config.credentials.clone();

    let cancel = ScanCancel::new();
    let span = spinner::scan_span();
    let scanner = DeviceScanner::new(&config, system::toolkit(&config))
        .with_cancel(cancel.clone())
        .with_progress(spinner::progress_callback(span.clone()));

    let start_time: Instant = Instant::now();
    // Dropping the scan future kills whatever tool it is waiting on.
    let result: ScanResult = tokio::select! {
        result = scanner.scan_for_device(&credentials).instrument(span) => result,
        () = watch_interrupts(cancel, tokio::signal::ctrl_c) => ScanError::Cancelled.into(),
    };

    Ok(scan_ends(&result, start_time.elapsed()))
}

/// The first interrupt cancels at the next boundary; returns on the second.
async fn watch_interrupts<F, Fut>(cancel: ScanCancel, mut interrupted: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if interrupted().await.is_err() {
        return future::pending().await;
    }
    warn!("Interrupted, stopping at the next candidate (press Ctrl-C again to abort)");
    cancel.cancel();

    if interrupted().await.is_err() {
        return future::pending().await;
    }
    warn!("Interrupted again, aborting the scan");
}

fn scan_ends(result: &ScanResult, total_time: Duration) -> ExitCode {
    mprint!();
    match result {
        ScanResult::Success {
            device_addr,
            sys_info,
        } => {
            print::header("instrument found");
            print::tree_head(0, &sys_info.serial_number);
            print::as_tree_one_level(&format::sys_info_to_details(
                &device_addr.to_string(),
                sys_info,
            ));
            print_summary(&sys_info.serial_number, total_time);
            ExitCode::SUCCESS
        }
        ScanResult::Failure { reason } => {
            print::header("no instrument found");
            print_reason(reason);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(serial: &str, total_time: Duration) {
    let serial: ColoredString = serial.bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString =
        format!("Scan Complete: {serial} answered in {total_time}").color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
}

/// Exhaustion reasons carry every per-interface diagnostic; show one per line.
fn print_reason(reason: &str) {
    match reason.split_once(": ") {
        Some(("Exhausted", diagnostics)) => {
            print::failure("Exhausted");
            for diagnostic in diagnostics.split("; ") {
                print::print_status(diagnostic);
            }
        }
        _ => print::failure(reason),
    }
}
