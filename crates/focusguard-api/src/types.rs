//! Shared types for the focusguard API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use focusguard_util::SessionId;
use std::time::Duration;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session; the block list and duration may be edited
    Idle,
    /// Enforcing; the user may stop at any time
    Running,
    /// Enforcing; stop is refused until the deadline passes
    RunningLocked,
}

/// Progress of the two-step lock confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockArm {
    #[default]
    Disarmed,
    /// Lock requested, waiting for confirmation
    Pending,
    /// Confirmed before start; the next session starts locked
    Armed,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// User cancelled a running (unlocked) session
    UserStop,
    /// Deadline reached
    Expired,
}

/// Information about the active session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub state: SessionState,
    pub started_at: DateTime<Local>,
    pub deadline: DateTime<Local>,
    pub time_remaining: Duration,
    /// Block list captured at start; this is what the enforcer targets
    pub targets: Vec<String>,
}

/// Full engine state as seen by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: SessionState,
    pub block_list: Vec<String>,
    pub pending_duration: Duration,
    /// End time if a session were started now (Idle with a positive duration only)
    pub projected_end: Option<DateTime<Local>>,
    pub lock: LockArm,
    pub session: Option<SessionInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_serialization() {
        let json = serde_json::to_string(&SessionState::RunningLocked).unwrap();
        assert_eq!(json, "\"running_locked\"");

        let parsed: SessionState = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(parsed, SessionState::Idle);
    }
}
