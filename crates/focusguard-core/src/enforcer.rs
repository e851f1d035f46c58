//! Enforcement loop: kills blocked processes once per tick until the deadline

use focusguard_host_api::{NotificationSink, ProcessScanner, ScanReport};
use focusguard_util::{MonotonicInstant, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::EnforcementPlan;

/// Period between scans and countdown updates
pub const ENFORCEMENT_INTERVAL: Duration = Duration::from_secs(1);

/// Messages from a running enforcement task to the service loop.
///
/// Every message carries the session it was produced for so the receiver
/// can drop messages from a session that has already ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcerEvent {
    Tick {
        session_id: SessionId,
        remaining: Duration,
    },

    AppBlocked {
        session_id: SessionId,
        name: String,
    },

    /// The deadline has passed; the task exits after sending this
    ExpireDue { session_id: SessionId },
}

impl EnforcerEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            EnforcerEvent::Tick { session_id, .. }
            | EnforcerEvent::AppBlocked { session_id, .. }
            | EnforcerEvent::ExpireDue { session_id } => session_id,
        }
    }
}

/// Spawns one enforcement task per session
#[derive(Clone)]
pub struct Enforcer {
    scanner: Arc<dyn ProcessScanner>,
    notifier: Option<Arc<dyn NotificationSink>>,
    interval: Duration,
}

impl Enforcer {
    pub fn new(scanner: Arc<dyn ProcessScanner>) -> Self {
        Self {
            scanner,
            notifier: None,
            interval: ENFORCEMENT_INTERVAL,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start enforcing `plan`. The task stops when the deadline passes, when
    /// the receiver goes away, or when the returned handle is dropped.
    pub fn spawn(
        &self,
        plan: EnforcementPlan,
        events: mpsc::UnboundedSender<EnforcerEvent>,
    ) -> EnforcerHandle {
        let session_id = plan.session_id.clone();
        let scanner = self.scanner.clone();
        let notifier = self.notifier.clone();
        let period = self.interval;

        info!(
            session_id = %session_id,
            targets = plan.targets.len(),
            "Enforcement started"
        );

        let task = tokio::spawn(async move {
            run(plan, scanner, notifier, period, events).await;
        });

        EnforcerHandle { session_id, task }
    }
}

async fn run(
    plan: EnforcementPlan,
    scanner: Arc<dyn ProcessScanner>,
    notifier: Option<Arc<dyn NotificationSink>>,
    period: Duration,
    events: mpsc::UnboundedSender<EnforcerEvent>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if MonotonicInstant::now() >= plan.deadline {
            debug!(session_id = %plan.session_id, "Deadline reached");
            let _ = events.send(EnforcerEvent::ExpireDue {
                session_id: plan.session_id.clone(),
            });
            break;
        }

        let report = scan(&scanner, &plan).await;

        for process in report.terminated {
            info!(pid = process.pid, app = %process.name, "Blocked process terminated");

            if let Some(notifier) = &notifier {
                notifier.notify(&process.name);
            }

            if events
                .send(EnforcerEvent::AppBlocked {
                    session_id: plan.session_id.clone(),
                    name: process.name,
                })
                .is_err()
            {
                return;
            }
        }

        if report.failures > 0 {
            debug!(failures = report.failures, "Some matching processes could not be killed");
        }

        let remaining = plan
            .deadline
            .saturating_duration_until(MonotonicInstant::now());

        if events
            .send(EnforcerEvent::Tick {
                session_id: plan.session_id.clone(),
                remaining,
            })
            .is_err()
        {
            debug!(session_id = %plan.session_id, "Event receiver closed, enforcement exiting");
            break;
        }
    }
}

/// Process enumeration blocks, so it runs off the async workers
async fn scan(scanner: &Arc<dyn ProcessScanner>, plan: &EnforcementPlan) -> ScanReport {
    let scanner = scanner.clone();
    let targets = plan.targets.clone();

    match tokio::task::spawn_blocking(move || scanner.scan_and_terminate(&targets)).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "Process scan task failed");
            ScanReport::default()
        }
    }
}

/// Owns a running enforcement task; dropping it cancels the task
pub struct EnforcerHandle {
    session_id: SessionId,
    task: JoinHandle<()>,
}

impl EnforcerHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for EnforcerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockList;
    use focusguard_host_api::{MockScanner, RecordingNotifier};

    fn plan_for(apps: &[&str], remaining: Duration) -> EnforcementPlan {
        let targets: BlockList = apps.iter().copied().collect();
        EnforcementPlan {
            session_id: SessionId::new(),
            targets: Arc::new(targets.to_target_set()),
            deadline: MonotonicInstant::now() + remaining,
        }
    }

    fn fast_enforcer(scanner: Arc<MockScanner>, notifier: RecordingNotifier) -> Enforcer {
        Enforcer::new(scanner)
            .with_notifier(Arc::new(notifier))
            .with_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_blocked_process_is_killed_and_notified() {
        let scanner = Arc::new(MockScanner::new());
        let chess = scanner.spawn("Chess");
        let editor = scanner.spawn("Editor");
        let notifier = RecordingNotifier::new();

        let enforcer = fast_enforcer(scanner.clone(), notifier.clone());
        let plan = plan_for(&["Chess"], Duration::from_secs(30));
        let session_id = plan.session_id.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = enforcer.spawn(plan, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            EnforcerEvent::AppBlocked { session_id: session_id.clone(), name: "Chess".into() }
        );
        assert!(matches!(rx.recv().await, Some(EnforcerEvent::Tick { .. })));

        assert!(!scanner.is_alive(chess));
        assert!(scanner.is_alive(editor));
        assert_eq!(notifier.notified(), vec!["Chess".to_string()]);
    }

    #[tokio::test]
    async fn test_relaunched_process_is_killed_again() {
        let scanner = Arc::new(MockScanner::new());
        scanner.spawn("Chess");
        let notifier = RecordingNotifier::new();

        let enforcer = fast_enforcer(scanner.clone(), notifier.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = enforcer.spawn(plan_for(&["Chess"], Duration::from_secs(30)), tx);

        let mut blocked = 0;
        while blocked < 2 {
            match rx.recv().await.unwrap() {
                EnforcerEvent::AppBlocked { .. } => {
                    blocked += 1;
                    if blocked == 1 {
                        scanner.spawn("Chess");
                    }
                }
                EnforcerEvent::Tick { .. } => {}
                other => panic!("unexpected event {:?}", other),
            }
        }

        assert_eq!(scanner.alive_named("Chess"), 0);
        assert_eq!(notifier.notified().len(), 2);
    }

    #[tokio::test]
    async fn test_protected_process_does_not_stop_enforcement() {
        let scanner = Arc::new(MockScanner::new());
        scanner.spawn_protected("Chess");
        let notifier = RecordingNotifier::new();

        let enforcer = fast_enforcer(scanner.clone(), notifier.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = enforcer.spawn(plan_for(&["Chess"], Duration::from_secs(30)), tx);

        for _ in 0..3 {
            assert!(matches!(rx.recv().await, Some(EnforcerEvent::Tick { .. })));
        }
        assert!(scanner.scan_count() >= 3);
        assert!(notifier.notified().is_empty());
    }

    #[tokio::test]
    async fn test_past_deadline_sends_expire_and_exits() {
        let scanner = Arc::new(MockScanner::new());
        scanner.spawn("Chess");

        let enforcer = fast_enforcer(scanner.clone(), RecordingNotifier::new());
        let plan = plan_for(&["Chess"], Duration::ZERO);
        let session_id = plan.session_id.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = enforcer.spawn(plan, tx);

        assert_eq!(rx.recv().await, Some(EnforcerEvent::ExpireDue { session_id }));
        assert_eq!(rx.recv().await, None);
        assert_eq!(scanner.scan_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_enforcement() {
        let scanner = Arc::new(MockScanner::new());
        let enforcer = fast_enforcer(scanner.clone(), RecordingNotifier::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = enforcer.spawn(plan_for(&["Chess"], Duration::from_secs(30)), tx);

        assert!(matches!(rx.recv().await, Some(EnforcerEvent::Tick { .. })));
        drop(handle);

        // Channel closes once the aborted task drops its sender
        while rx.recv().await.is_some() {}
    }

    #[test]
    fn test_event_session_id() {
        let id = SessionId::new();
        let event = EnforcerEvent::ExpireDue { session_id: id.clone() };
        assert_eq!(event.session_id(), &id);
    }
}
