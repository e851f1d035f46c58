//! Process enumeration and termination

use focusguard_host_api::{
    HostError, HostResult, ProcessScanner, ScanReport, TerminatedProcess,
};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use sysinfo::{Pid, System};
use tracing::{debug, warn};

/// Length at which the kernel truncates `/proc/<pid>/comm`
const COMM_MAX_LEN: usize = 15;

/// Scans the live process table with `sysinfo` and kills matches with SIGKILL
pub struct SystemProcessScanner {
    system: Mutex<System>,
    own_pid: Option<Pid>,
}

impl SystemProcessScanner {
    pub fn new() -> Self {
        let own_pid = sysinfo::get_current_pid()
            .map_err(|e| warn!(error = %e, "Could not determine own pid"))
            .ok();

        Self {
            system: Mutex::new(System::new()),
            own_pid,
        }
    }
}

impl Default for SystemProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessScanner for SystemProcessScanner {
    fn scan_and_terminate(&self, targets: &HashSet<String>) -> ScanReport {
        let mut report = ScanReport::default();
        if targets.is_empty() {
            return report;
        }

        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_processes();

        // Linux lists every thread as its own entry sharing the process name
        let threads = thread_ids(&system);

        for (pid, process) in system.processes() {
            if Some(*pid) == self.own_pid || threads.contains(pid) {
                continue;
            }

            let Some(name) = matching_target(process.name(), process.exe(), targets) else {
                continue;
            };

            match kill_process(pid.as_u32()) {
                Ok(()) => report.terminated.push(TerminatedProcess {
                    pid: pid.as_u32(),
                    name: name.to_string(),
                }),
                Err(e) => {
                    debug!(pid = pid.as_u32(), app = %name, error = %e, "Could not kill process");
                    report.failures += 1;
                }
            }
        }

        report
    }
}

/// Pids of non-leader threads, which share their process's name
fn thread_ids(system: &System) -> HashSet<Pid> {
    system
        .processes()
        .iter()
        .filter_map(|(pid, process)| process.tasks().map(|tasks| (pid, tasks)))
        .flat_map(|(pid, tasks)| tasks.iter().filter(move |task| *task != pid).copied())
        .collect()
}

/// Returns the target a process matches, if any.
///
/// Matching is exact on the process name. Names the kernel truncated are
/// matched against the executable's file name instead.
pub fn matching_target<'a>(
    name: &str,
    exe: Option<&Path>,
    targets: &'a HashSet<String>,
) -> Option<&'a str> {
    if let Some(target) = targets.get(name) {
        return Some(target.as_str());
    }

    if name.len() != COMM_MAX_LEN {
        return None;
    }

    let exe_name = exe?.file_name()?.to_str()?;
    if !exe_name.starts_with(name) {
        return None;
    }
    targets.get(exe_name).map(String::as_str)
}

/// Send SIGKILL to a single process
pub fn kill_process(pid: u32) -> HostResult<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| HostError::Internal(format!("pid {} out of range", pid)))?;

    match signal::kill(NixPid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(HostError::ProcessGone { pid }),
        Err(Errno::EPERM) => Err(HostError::PermissionDenied(format!(
            "not allowed to signal process {}",
            pid
        ))),
        Err(e) => Err(HostError::SignalFailed(format!(
            "Failed to send SIGKILL to {}: {}",
            pid, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::process::Command;

    fn targets(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn exact_name_matches() {
        let t = targets(&["Chess"]);
        assert_eq!(matching_target("Chess", None, &t), Some("Chess"));
        assert_eq!(matching_target("chess", None, &t), None);
        assert_eq!(matching_target("Chess2", None, &t), None);
    }

    #[test]
    fn truncated_name_matches_executable() {
        let t = targets(&["gnome-system-monitor"]);
        let exe = PathBuf::from("/usr/bin/gnome-system-monitor");

        assert_eq!(
            matching_target("gnome-system-mo", Some(&exe), &t),
            Some("gnome-system-monitor")
        );
        // Untruncated names never fall back to the executable
        assert_eq!(matching_target("monitor", Some(&exe), &t), None);
    }

    #[test]
    fn kill_missing_process_reports_gone() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        assert!(matches!(kill_process(pid), Err(HostError::ProcessGone { .. })));
    }

    #[test]
    fn scan_kills_matching_process() {
        // A uniquely named copy of sleep so nothing else on the machine matches
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fg-block-test");
        std::fs::copy("/bin/sleep", &exe).unwrap();

        let Ok(mut child) = Command::new(&exe).arg("60").spawn() else {
            // Temp dir mounted noexec
            return;
        };
        let pid = child.id();
        std::thread::sleep(std::time::Duration::from_millis(50));

        let scanner = SystemProcessScanner::new();
        let report = scanner.scan_and_terminate(&targets(&["fg-block-test"]));

        assert!(report.terminated.iter().any(|p| p.pid == pid && p.name == "fg-block-test"));

        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    /// Body of the multithreaded child spawned by `scan_kills_threaded_process_once`
    #[test]
    #[ignore]
    fn threaded_sleeper() {
        if std::env::var_os("FG_THREADED_SLEEPER").is_none() {
            return;
        }
        // Each worker carries the process name, as threads of real apps do
        let workers: Vec<_> = (0..4)
            .map(|_| {
                std::thread::Builder::new()
                    .name("fg-thread-test".into())
                    .spawn(|| std::thread::sleep(std::time::Duration::from_secs(60)))
                    .unwrap()
            })
            .collect();
        for worker in workers {
            let _ = worker.join();
        }
    }

    #[test]
    fn scan_kills_threaded_process_once() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fg-thread-test");
        std::fs::copy(std::env::current_exe().unwrap(), &exe).unwrap();

        let Ok(mut child) = Command::new(&exe)
            .args(["--ignored", "--exact", "scanner::tests::threaded_sleeper"])
            .env("FG_THREADED_SLEEPER", "1")
            .stdout(std::process::Stdio::null())
            .spawn()
        else {
            return;
        };
        let pid = child.id();
        std::thread::sleep(std::time::Duration::from_millis(300));

        let scanner = SystemProcessScanner::new();
        let report = scanner.scan_and_terminate(&targets(&["fg-thread-test"]));

        assert_eq!(
            report.terminated,
            vec![TerminatedProcess {
                pid,
                name: "fg-thread-test".to_string(),
            }]
        );
        assert!(!child.wait().unwrap().success());
    }

    #[test]
    fn scan_with_no_targets_is_empty() {
        let scanner = SystemProcessScanner::new();
        assert_eq!(scanner.scan_and_terminate(&HashSet::new()), ScanReport::default());
    }
}
