//! Collaborator traits

use focusguard_api::StateSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Process {pid} exited before it could be signalled")]
    ProcessGone { pid: u32 },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Signal failed: {0}")]
    SignalFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// A process killed during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminatedProcess {
    pub pid: u32,
    pub name: String,
}

/// Outcome of one enforcement scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub terminated: Vec<TerminatedProcess>,
    /// Matches that could not be killed (vanished, permission denied)
    pub failures: usize,
}

impl ScanReport {
    /// Number of processes terminated
    pub fn count(&self) -> usize {
        self.terminated.len()
    }
}

/// Enumerates live processes and kills those whose name is a target.
///
/// Matching is exact string equality on the process display name. Per-process
/// failures are counted in the report, never returned as errors.
pub trait ProcessScanner: Send + Sync {
    fn scan_and_terminate(&self, targets: &HashSet<String>) -> ScanReport;
}

/// One-shot, non-blocking user notification for a killed process
pub trait NotificationSink: Send + Sync {
    fn notify(&self, app_name: &str);
}

/// Source of application names the user can choose to block
pub trait AppCatalog: Send + Sync {
    /// Installed and running applications minus the exclusion set;
    /// deduplicated, case-sensitive, sorted.
    fn list_candidate_apps(&self) -> Vec<String>;
}

/// Receives state changes from the service loop for display
pub trait PresentationSink {
    /// Called once per enforcement tick while a session runs
    fn on_tick(&mut self, remaining: Duration);

    fn on_state_changed(&mut self, snapshot: &StateSnapshot);

    fn on_app_blocked(&mut self, name: &str);

    /// A user intent was refused; `message` is suitable for display
    fn on_rejected(&mut self, message: &str);

    /// Candidate applications were listed at the user's request
    fn on_candidates(&mut self, apps: &[String]);

    /// Bring the presentation surface to the foreground
    fn raise(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_report_count() {
        let report = ScanReport {
            terminated: vec![
                TerminatedProcess { pid: 10, name: "Chess".into() },
                TerminatedProcess { pid: 11, name: "Chess".into() },
            ],
            failures: 1,
        };
        assert_eq!(report.count(), 2);
        assert_eq!(ScanReport::default().count(), 0);
    }

    #[test]
    fn host_error_display() {
        let err = HostError::ProcessGone { pid: 42 };
        assert!(err.to_string().contains("42"));
    }
}
