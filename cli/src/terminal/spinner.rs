use std::sync::atomic::{AtomicUsize, Ordering};

use colored::*;
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use linkr_core::scanner::{ProgressCallback, ScanStage};

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS)
}

/// Span that owns the spinner; it shows while the span is entered.
pub fn scan_span() -> Span {
    let span = info_span!("scan", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message("Looking for link-local interfaces...");
    span
}

/// Mirrors scan stages onto the spinner of `span`.
pub fn progress_callback(span: Span) -> ProgressCallback {
    let examined = AtomicUsize::new(0);
    Box::new(move |stage: &ScanStage| {
        if matches!(stage, ScanStage::Probing(_)) {
            examined.fetch_add(1, Ordering::Relaxed);
        }
        span.pb_set_message(&stage_message(stage, examined.load(Ordering::Relaxed)));
    })
}

fn stage_message(stage: &ScanStage, examined: usize) -> String {
    let progress: String = format!("[{} examined]", examined.to_string().green().bold());
    match stage {
        ScanStage::Refreshing(intf) => {
            format!("Refreshing neighbors on {} {progress}", intf.to_string().bold())
        }
        ScanStage::Probing(candidate) => {
            format!("Probing {} {progress}", candidate.addr.to_string().bold())
        }
        ScanStage::Authenticating(candidate) => {
            format!("Opening a session to {} {progress}", candidate.addr.to_string().bold())
        }
    }
}
