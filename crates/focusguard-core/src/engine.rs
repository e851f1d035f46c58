//! Session engine: the single owner of session state and the block list

use chrono::{DateTime, Local};
use focusguard_api::{Intent, LockArm, SessionEndReason, SessionState, StateSnapshot};
use focusguard_util::{MonotonicInstant, SessionId};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{ActiveSession, BlockList, CoreEvent, EnforcementPlan};

/// Longest duration that can be pending; larger values are clamped
pub const MAX_SESSION_DURATION: Duration = Duration::from_secs(7 * 24 * 3600);

/// Errors returned for rejected user intents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid session request: {0}")]
    InvalidSessionRequest(String),

    #[error("Session is locked and cannot be stopped until it expires")]
    SessionLocked,

    #[error("Not allowed while a session is running")]
    SessionActive,

    #[error("No active session")]
    NoActiveSession,

    #[error("Lock mode was not requested")]
    LockNotRequested,
}

pub type CoreResult<T> = Result<T, CoreError>;

/// The session engine.
///
/// Owns the block list, the pending duration, the lock confirmation and the
/// active session. It never touches the OS; callers feed it the current time
/// and act on the [`CoreEvent`]s it returns.
#[derive(Debug, Default)]
pub struct SessionEngine {
    block_list: BlockList,
    pending_duration: Duration,
    lock: LockArm,
    current_session: Option<ActiveSession>,
}

impl SessionEngine {
    /// Create an idle engine with a previously saved block list
    pub fn new(block_list: impl IntoIterator<Item = String>) -> Self {
        let block_list: BlockList = block_list.into_iter().collect();

        info!(block_list_len = block_list.len(), "Session engine initialized");

        Self {
            block_list,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionState {
        self.current_session
            .as_ref()
            .map(ActiveSession::state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn block_list(&self) -> &BlockList {
        &self.block_list
    }

    pub fn pending_duration(&self) -> Duration {
        self.pending_duration
    }

    pub fn lock_arm(&self) -> LockArm {
        self.lock
    }

    /// Get current session reference
    pub fn current_session(&self) -> Option<&ActiveSession> {
        self.current_session.as_ref()
    }

    /// Check if a session is active
    pub fn has_active_session(&self) -> bool {
        self.current_session.is_some()
    }

    /// Remaining time of the active session
    pub fn time_remaining(&self, now_mono: MonotonicInstant) -> Option<Duration> {
        self.current_session
            .as_ref()
            .map(|s| s.time_remaining(now_mono))
    }

    /// Targets and deadline for the enforcement loop
    pub fn enforcement_plan(&self) -> Option<EnforcementPlan> {
        self.current_session
            .as_ref()
            .map(ActiveSession::enforcement_plan)
    }

    /// Apply a user intent
    pub fn apply(
        &mut self,
        intent: Intent,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> CoreResult<Vec<CoreEvent>> {
        debug!(intent = ?intent, "Applying intent");

        let event = match intent {
            Intent::AddApps { names } => self.add_apps(names)?,
            Intent::RemoveApp { name } => self.remove_app(&name)?,
            Intent::ClearApps => self.clear_apps()?,
            Intent::AdjustDuration { delta_seconds } => Some(CoreEvent::DurationChanged {
                pending: self.adjust_duration(delta_seconds)?,
            }),
            Intent::SetDurationAbsolute { hours, minutes } => {
                Some(CoreEvent::DurationChanged {
                    pending: self.set_duration_absolute(hours, minutes)?,
                })
            }
            Intent::ResetDuration => Some(CoreEvent::DurationChanged {
                pending: self.reset_duration()?,
            }),
            Intent::Start => Some(self.start(now, now_mono)?),
            Intent::Stop => Some(self.stop(now_mono)?),
            Intent::RequestLock => {
                self.request_lock();
                None
            }
            Intent::ConfirmLock => self.confirm_lock()?,
            Intent::CancelLockRequest => {
                self.cancel_lock_request();
                None
            }
        };

        Ok(event.into_iter().collect())
    }

    fn ensure_idle(&self) -> CoreResult<()> {
        if self.has_active_session() {
            return Err(CoreError::SessionActive);
        }
        Ok(())
    }

    fn block_list_changed(&self) -> CoreEvent {
        CoreEvent::BlockListChanged {
            apps: self.block_list.as_slice().to_vec(),
        }
    }

    /// Add applications to the block list (Idle only)
    pub fn add_apps(
        &mut self,
        names: impl IntoIterator<Item = String>,
    ) -> CoreResult<Option<CoreEvent>> {
        self.ensure_idle()?;

        let mut added = 0;
        for name in names {
            if self.block_list.add(name) {
                added += 1;
            }
        }

        if added == 0 {
            return Ok(None);
        }

        info!(added, block_list_len = self.block_list.len(), "Apps added to block list");
        Ok(Some(self.block_list_changed()))
    }

    /// Remove an application from the block list (Idle only)
    pub fn remove_app(&mut self, name: &str) -> CoreResult<Option<CoreEvent>> {
        self.ensure_idle()?;

        if !self.block_list.remove(name) {
            return Ok(None);
        }

        info!(app = %name, "App removed from block list");
        Ok(Some(self.block_list_changed()))
    }

    /// Empty the block list (Idle only)
    pub fn clear_apps(&mut self) -> CoreResult<Option<CoreEvent>> {
        self.ensure_idle()?;

        if !self.block_list.clear() {
            return Ok(None);
        }

        info!("Block list cleared");
        Ok(Some(self.block_list_changed()))
    }

    /// Add `delta_seconds` to the pending duration.
    ///
    /// A total at or below zero resets the pending duration to exactly zero,
    /// so later additions start from nothing.
    pub fn adjust_duration(&mut self, delta_seconds: i64) -> CoreResult<Duration> {
        if self.has_active_session() {
            return Err(CoreError::InvalidSessionRequest(
                "duration cannot change while a session is running".into(),
            ));
        }

        let max = MAX_SESSION_DURATION.as_secs() as i64;
        let total = (self.pending_duration.as_secs() as i64)
            .saturating_add(delta_seconds)
            .clamp(0, max);
        self.pending_duration = Duration::from_secs(total as u64);

        debug!(
            delta_seconds,
            pending_secs = total,
            "Duration adjusted"
        );

        Ok(self.pending_duration)
    }

    /// Replace the pending duration with `hours:minutes`
    pub fn set_duration_absolute(&mut self, hours: u32, minutes: u32) -> CoreResult<Duration> {
        if self.has_active_session() {
            return Err(CoreError::InvalidSessionRequest(
                "duration cannot change while a session is running".into(),
            ));
        }

        let total = u64::from(hours) * 3600 + u64::from(minutes) * 60;
        if total == 0 {
            return Err(CoreError::InvalidSessionRequest(
                "enter at least one minute".into(),
            ));
        }

        self.pending_duration = Duration::from_secs(total).min(MAX_SESSION_DURATION);
        Ok(self.pending_duration)
    }

    /// Zero the pending duration
    pub fn reset_duration(&mut self) -> CoreResult<Duration> {
        if self.has_active_session() {
            return Err(CoreError::InvalidSessionRequest(
                "duration cannot change while a session is running".into(),
            ));
        }

        self.pending_duration = Duration::ZERO;
        Ok(self.pending_duration)
    }

    /// Arm a pending lock confirmation. Does not change session state.
    pub fn request_lock(&mut self) {
        if self.state() == SessionState::RunningLocked {
            return;
        }
        if self.lock == LockArm::Disarmed {
            self.lock = LockArm::Pending;
            debug!("Lock requested, awaiting confirmation");
        }
    }

    /// Confirm a pending lock request.
    ///
    /// While idle the lock is armed for the next start; while running the
    /// session becomes locked immediately.
    pub fn confirm_lock(&mut self) -> CoreResult<Option<CoreEvent>> {
        match (self.lock, self.current_session.as_mut()) {
            (_, Some(session)) if session.locked => Ok(None),
            (LockArm::Armed, None) => Ok(None),
            (LockArm::Pending, None) => {
                self.lock = LockArm::Armed;
                info!("Lock armed for next session");
                Ok(Some(CoreEvent::LockArmed))
            }
            (LockArm::Pending, Some(session)) => {
                session.locked = true;
                self.lock = LockArm::Disarmed;
                info!(session_id = %session.session_id, "Session locked");
                Ok(Some(CoreEvent::LockEngaged {
                    session_id: session.session_id.clone(),
                }))
            }
            _ => Err(CoreError::LockNotRequested),
        }
    }

    /// Discard a pending lock request, or an armed lock that has not started.
    ///
    /// Has no effect on a session that is already locked.
    pub fn cancel_lock_request(&mut self) {
        match (self.lock, self.has_active_session()) {
            (LockArm::Pending, _) | (LockArm::Armed, false) => {
                self.lock = LockArm::Disarmed;
                debug!("Lock request cancelled");
            }
            _ => {}
        }
    }

    /// Start a session with the current block list and pending duration
    pub fn start(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> CoreResult<CoreEvent> {
        self.ensure_idle()?;

        if self.block_list.is_empty() {
            return Err(CoreError::InvalidSessionRequest(
                "add at least one app to block".into(),
            ));
        }
        if self.pending_duration.is_zero() {
            return Err(CoreError::InvalidSessionRequest(
                "set a duration first".into(),
            ));
        }

        let locked = self.lock == LockArm::Armed;
        if locked {
            self.lock = LockArm::Disarmed;
        }

        let session = ActiveSession::new(
            self.block_list.clone(),
            self.pending_duration,
            locked,
            now,
            now_mono,
        );

        info!(
            session_id = %session.session_id,
            deadline = %session.deadline,
            targets = session.targets.len(),
            locked,
            "Session started"
        );

        let event = CoreEvent::SessionStarted {
            session_id: session.session_id.clone(),
            deadline: session.deadline,
            locked,
        };

        self.current_session = Some(session);

        Ok(event)
    }

    /// Stop the current session at the user's request
    pub fn stop(&mut self, now_mono: MonotonicInstant) -> CoreResult<CoreEvent> {
        match &self.current_session {
            None => return Err(CoreError::NoActiveSession),
            Some(session) if session.locked => {
                warn!(session_id = %session.session_id, "Stop refused, session is locked");
                return Err(CoreError::SessionLocked);
            }
            Some(_) => {}
        }

        self.end_session(SessionEndReason::UserStop, now_mono)
            .ok_or(CoreError::NoActiveSession)
    }

    /// End the session if `session_id` is current and its deadline has passed.
    ///
    /// Late or repeated calls for the same session return `None`.
    pub fn expire(
        &mut self,
        session_id: &SessionId,
        now_mono: MonotonicInstant,
    ) -> Option<CoreEvent> {
        let session = self.current_session.as_ref()?;

        if &session.session_id != session_id {
            debug!(session_id = %session_id, "Ignoring expiry for stale session");
            return None;
        }
        if !session.is_expired(now_mono) {
            return None;
        }

        self.end_session(SessionEndReason::Expired, now_mono)
    }

    fn end_session(
        &mut self,
        reason: SessionEndReason,
        now_mono: MonotonicInstant,
    ) -> Option<CoreEvent> {
        let session = self.current_session.take()?;
        let duration = session.duration_so_far(now_mono);

        // A lock never carries over into the next session
        self.lock = LockArm::Disarmed;

        info!(
            session_id = %session.session_id,
            reason = ?reason,
            duration_secs = duration.as_secs(),
            "Session ended"
        );

        Some(CoreEvent::SessionEnded {
            session_id: session.session_id,
            reason,
            duration,
        })
    }

    /// Get current state snapshot for display
    pub fn snapshot(&self, now: DateTime<Local>, now_mono: MonotonicInstant) -> StateSnapshot {
        let session = self
            .current_session
            .as_ref()
            .map(|s| s.to_session_info(now_mono));

        let projected_end = if session.is_none() && !self.pending_duration.is_zero() {
            chrono::Duration::from_std(self.pending_duration)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
        } else {
            None
        };

        StateSnapshot {
            state: self.state(),
            block_list: self.block_list.as_slice().to_vec(),
            pending_duration: self.pending_duration,
            projected_end,
            lock: self.lock,
            session,
        }
    }
}
