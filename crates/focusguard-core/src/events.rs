//! Core events emitted by the engine

use chrono::{DateTime, Local};
use focusguard_api::SessionEndReason;
use focusguard_util::SessionId;
use std::time::Duration;

/// Events emitted by the session engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Session started; enforcement should begin
    SessionStarted {
        session_id: SessionId,
        deadline: DateTime<Local>,
        locked: bool,
    },

    /// Lock confirmed while idle; the next session starts locked
    LockArmed,

    /// Lock confirmed during a running session
    LockEngaged { session_id: SessionId },

    /// Session has ended; enforcement should stop
    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
        duration: Duration,
    },

    /// Block list contents changed and should be persisted
    BlockListChanged { apps: Vec<String> },

    /// Pending duration changed
    DurationChanged { pending: Duration },
}
