//! # Scan Error Taxonomy
//!
//! Errors fall in three scopes:
//! * **scan-wide**: [`ScanError::NoInterfaceFound`], [`ScanError::ToolMissing`],
//!   [`ScanError::Exhausted`] and [`ScanError::Cancelled`] end the scan.
//! * **per-interface**: privilege and sweep problems skip the current interface.
//! * **per-candidate**: reachability, authentication and payload problems skip the
//!   current candidate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("no link-local interface")]
    NoInterfaceFound,

    #[error("ToolMissing: {0}")]
    ToolMissing(String),

    #[error("privilege escalation declined")]
    PrivilegeDenied,

    #[error("privilege escalation failed: {0}")]
    PrivilegeFailed(String),

    #[error("sweep failed: {0}")]
    SweepFailed(String),

    #[error("Unreachable")]
    Unreachable,

    #[error("PortClosed")]
    PortClosed,

    #[error("AuthenticationFailed")]
    AuthenticationFailed,

    #[error("PayloadInvalid")]
    PayloadInvalid(String),

    #[error("{}", exhausted_reason(.0))]
    Exhausted(Vec<String>),

    #[error("cancelled")]
    Cancelled,
}

impl ScanError {
    /// Scan-wide conditions that end the scan instead of skipping ahead.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::NoInterfaceFound
                | ScanError::ToolMissing(_)
                | ScanError::Exhausted(_)
                | ScanError::Cancelled
        )
    }
}

fn exhausted_reason(diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        "Exhausted".to_string()
    } else {
        format!("Exhausted: {}", diagnostics.join("; "))
    }
}
