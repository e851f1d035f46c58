//! Active session tracking

use chrono::{DateTime, Local};
use focusguard_api::{SessionInfo, SessionState};
use focusguard_util::{MonotonicInstant, SessionId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::BlockList;

/// Active session tracking
#[derive(Debug)]
pub struct ActiveSession {
    pub session_id: SessionId,

    /// Block list captured at start
    pub targets: BlockList,

    pub duration: Duration,

    /// Stop is refused while set; cleared only by the session ending
    pub locked: bool,

    /// Wall-clock start time (for display/logging)
    pub started_at: DateTime<Local>,

    /// Monotonic start time (for enforcement)
    pub started_at_mono: MonotonicInstant,

    /// Wall-clock deadline (for display)
    pub deadline: DateTime<Local>,

    /// Monotonic deadline (for enforcement)
    pub deadline_mono: MonotonicInstant,
}

impl ActiveSession {
    /// Create a new session starting now
    pub fn new(
        targets: BlockList,
        duration: Duration,
        locked: bool,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Self {
        let deadline = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        let deadline_mono = now_mono + duration;

        Self {
            session_id: SessionId::new(),
            targets,
            duration,
            locked,
            started_at: now,
            started_at_mono: now_mono,
            deadline,
            deadline_mono,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.locked {
            SessionState::RunningLocked
        } else {
            SessionState::Running
        }
    }

    /// Get time remaining using monotonic time
    pub fn time_remaining(&self, now_mono: MonotonicInstant) -> Duration {
        self.deadline_mono.saturating_duration_until(now_mono)
    }

    /// Check if session is expired
    pub fn is_expired(&self, now_mono: MonotonicInstant) -> bool {
        now_mono >= self.deadline_mono
    }

    /// Get session duration so far
    pub fn duration_so_far(&self, now_mono: MonotonicInstant) -> Duration {
        now_mono.duration_since(self.started_at_mono)
    }

    /// What the enforcer needs to run this session
    pub fn enforcement_plan(&self) -> EnforcementPlan {
        EnforcementPlan {
            session_id: self.session_id.clone(),
            targets: Arc::new(self.targets.to_target_set()),
            deadline: self.deadline_mono,
        }
    }

    /// Get session info for display
    pub fn to_session_info(&self, now_mono: MonotonicInstant) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            state: self.state(),
            started_at: self.started_at,
            deadline: self.deadline,
            time_remaining: self.time_remaining(now_mono),
            targets: self.targets.as_slice().to_vec(),
        }
    }
}

/// Everything the enforcement loop reads; it never touches the engine
#[derive(Debug, Clone)]
pub struct EnforcementPlan {
    pub session_id: SessionId,
    pub targets: Arc<HashSet<String>>,
    pub deadline: MonotonicInstant,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(duration_secs: u64, locked: bool) -> (ActiveSession, MonotonicInstant) {
        let now_mono = MonotonicInstant::now();
        let targets: BlockList = ["Chess"].into_iter().collect();
        let session = ActiveSession::new(
            targets,
            Duration::from_secs(duration_secs),
            locked,
            Local::now(),
            now_mono,
        );
        (session, now_mono)
    }

    #[test]
    fn test_session_creation() {
        let (session, now_mono) = make_session(300, false);

        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.time_remaining(now_mono), Duration::from_secs(300));
        assert_eq!(
            session.deadline - session.started_at,
            chrono::Duration::seconds(300)
        );
    }

    #[test]
    fn test_locked_state() {
        let (session, _) = make_session(60, true);
        assert_eq!(session.state(), SessionState::RunningLocked);
    }

    #[test]
    fn test_expiry_boundary() {
        let (session, now_mono) = make_session(60, false);

        assert!(!session.is_expired(now_mono + Duration::from_secs(59)));
        assert!(session.is_expired(now_mono + Duration::from_secs(60)));
        assert_eq!(
            session.time_remaining(now_mono + Duration::from_secs(61)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_enforcement_plan_targets() {
        let (session, now_mono) = make_session(60, false);
        let plan = session.enforcement_plan();

        assert_eq!(plan.session_id, session.session_id);
        assert!(plan.targets.contains("Chess"));
        assert_eq!(plan.deadline, now_mono + Duration::from_secs(60));
    }
}
