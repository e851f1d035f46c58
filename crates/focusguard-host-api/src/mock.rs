//! Mock collaborators for testing

use focusguard_api::StateSnapshot;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    AppCatalog, NotificationSink, PresentationSink, ProcessScanner, ScanReport,
    TerminatedProcess,
};

/// Simulated process for [`MockScanner`]
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub pid: u32,
    pub name: String,
    pub alive: bool,
    /// Simulates a process owned by another user
    pub protected: bool,
}

/// In-memory process table standing in for the OS
pub struct MockScanner {
    next_pid: AtomicU32,
    processes: Arc<Mutex<Vec<MockProcess>>>,
    scans: AtomicU32,
}

impl MockScanner {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            processes: Arc::new(Mutex::new(Vec::new())),
            scans: AtomicU32::new(0),
        }
    }

    /// Start a simulated process, returning its pid
    pub fn spawn(&self, name: &str) -> u32 {
        self.spawn_inner(name, false)
    }

    /// Start a simulated process the scanner is not allowed to kill
    pub fn spawn_protected(&self, name: &str) -> u32 {
        self.spawn_inner(name, true)
    }

    fn spawn_inner(&self, name: &str, protected: bool) -> u32 {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.processes.lock().unwrap().push(MockProcess {
            pid,
            name: name.to_string(),
            alive: true,
            protected,
        });
        pid
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.processes
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.pid == pid && p.alive)
    }

    /// Number of live processes with this exact name
    pub fn alive_named(&self, name: &str) -> usize {
        self.processes
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.alive && p.name == name)
            .count()
    }

    /// Number of scans performed so far
    pub fn scan_count(&self) -> u32 {
        self.scans.load(Ordering::SeqCst)
    }
}

impl Default for MockScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessScanner for MockScanner {
    fn scan_and_terminate(&self, targets: &HashSet<String>) -> ScanReport {
        self.scans.fetch_add(1, Ordering::SeqCst);

        let mut report = ScanReport::default();
        let mut processes = self.processes.lock().unwrap();

        for process in processes.iter_mut().filter(|p| p.alive) {
            if !targets.contains(&process.name) {
                continue;
            }
            if process.protected {
                report.failures += 1;
                continue;
            }
            process.alive = false;
            report.terminated.push(TerminatedProcess {
                pid: process.pid,
                name: process.name.clone(),
            });
        }

        report
    }
}

/// Notification sink that records every notification
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notified: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, app_name: &str) {
        self.notified.lock().unwrap().push(app_name.to_string());
    }
}

/// Catalog returning a fixed list
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub apps: Vec<String>,
}

impl StaticCatalog {
    pub fn new(apps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            apps: apps.into_iter().map(Into::into).collect(),
        }
    }
}

impl AppCatalog for StaticCatalog {
    fn list_candidate_apps(&self) -> Vec<String> {
        self.apps.clone()
    }
}

/// Everything a [`RecordingPresenter`] has been told
#[derive(Debug, Clone, Default)]
pub struct PresenterLog {
    pub ticks: Vec<Duration>,
    pub snapshots: Vec<StateSnapshot>,
    pub blocked: Vec<String>,
    pub rejections: Vec<String>,
    pub candidates: Vec<Vec<String>>,
    pub raises: usize,
}

/// Presentation sink that records calls; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    log: Arc<Mutex<PresenterLog>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> PresenterLog {
        self.log.lock().unwrap().clone()
    }
}

impl PresentationSink for RecordingPresenter {
    fn on_tick(&mut self, remaining: Duration) {
        self.log.lock().unwrap().ticks.push(remaining);
    }

    fn on_state_changed(&mut self, snapshot: &StateSnapshot) {
        self.log.lock().unwrap().snapshots.push(snapshot.clone());
    }

    fn on_app_blocked(&mut self, name: &str) {
        self.log.lock().unwrap().blocked.push(name.to_string());
    }

    fn on_rejected(&mut self, message: &str) {
        self.log.lock().unwrap().rejections.push(message.to_string());
    }

    fn on_candidates(&mut self, apps: &[String]) {
        self.log.lock().unwrap().candidates.push(apps.to_vec());
    }

    fn raise(&mut self) {
        self.log.lock().unwrap().raises += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn mock_scanner_kills_exact_matches_only() {
        let scanner = MockScanner::new();
        let chess = scanner.spawn("Chess");
        let chess_helper = scanner.spawn("Chess Helper");
        let lower = scanner.spawn("chess");

        let report = scanner.scan_and_terminate(&targets(&["Chess"]));

        assert_eq!(report.count(), 1);
        assert!(!scanner.is_alive(chess));
        assert!(scanner.is_alive(chess_helper));
        assert!(scanner.is_alive(lower));
    }

    #[test]
    fn mock_scanner_counts_protected_as_failure() {
        let scanner = MockScanner::new();
        let pid = scanner.spawn_protected("Chess");

        let report = scanner.scan_and_terminate(&targets(&["Chess"]));

        assert_eq!(report.count(), 0);
        assert_eq!(report.failures, 1);
        assert!(scanner.is_alive(pid));
    }

    #[test]
    fn recording_presenter_clones_share_log() {
        let presenter = RecordingPresenter::new();
        let mut sink = presenter.clone();
        sink.on_app_blocked("Chess");
        sink.raise();

        let log = presenter.log();
        assert_eq!(log.blocked, vec!["Chess".to_string()]);
        assert_eq!(log.raises, 1);
    }
}
