//! The service loop: sole owner of the session engine

use anyhow::{Context, Result};
use focusguard_api::{Intent, SessionState, StateSnapshot};
use focusguard_core::{
    CoreError, CoreEvent, Enforcer, EnforcerEvent, EnforcerHandle, SessionEngine,
};
use focusguard_host_api::{AppCatalog, PresentationSink};
use focusguard_ipc::RaiseSignal;
use focusguard_store::BlockListStore;
use focusguard_util::MonotonicInstant;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A request from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    /// List applications the user could add to the block list
    ListApps,
    Status,
    Quit,
    /// Input the presentation layer could not understand
    Unrecognized(String),
}

/// Whether the loop keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Main service state
pub struct Service<P> {
    engine: SessionEngine,
    store: Arc<dyn BlockListStore>,
    enforcer: Enforcer,
    catalog: Arc<dyn AppCatalog>,
    presenter: P,
    enforcement: Option<EnforcerHandle>,
    enforcer_tx: mpsc::UnboundedSender<EnforcerEvent>,
    enforcer_rx: mpsc::UnboundedReceiver<EnforcerEvent>,
    candidates_tx: mpsc::UnboundedSender<Vec<String>>,
    candidates_rx: mpsc::UnboundedReceiver<Vec<String>>,
}

impl<P: PresentationSink> Service<P> {
    /// Build the service around the block list saved in `store`
    pub fn new(
        store: Arc<dyn BlockListStore>,
        enforcer: Enforcer,
        catalog: Arc<dyn AppCatalog>,
        presenter: P,
    ) -> Self {
        let engine = SessionEngine::new(store.load_or_default());
        let (enforcer_tx, enforcer_rx) = mpsc::unbounded_channel();
        let (candidates_tx, candidates_rx) = mpsc::unbounded_channel();

        Self {
            engine,
            store,
            enforcer,
            catalog,
            presenter,
            enforcement: None,
            enforcer_tx,
            enforcer_rx,
            candidates_tx,
            candidates_rx,
        }
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Whether an enforcement task is attached to the current session
    pub fn is_enforcing(&self) -> bool {
        self.enforcement.is_some()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.engine
            .snapshot(focusguard_util::now(), MonotonicInstant::now())
    }

    /// Run until the user quits or the process is asked to shut down.
    ///
    /// Termination signals are treated like `quit`, so they are refused while
    /// a locked session runs.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut raises: mpsc::UnboundedReceiver<RaiseSignal>,
    ) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let mut commands_open = true;
        let mut raises_open = true;

        self.publish_state();
        info!("Service running");

        loop {
            let flow = tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                    self.handle_command(Command::Quit)
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT");
                    self.handle_command(Command::Quit)
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP");
                    self.handle_command(Command::Quit)
                }

                Some(event) = self.enforcer_rx.recv() => {
                    self.handle_enforcer_event(event);
                    Flow::Continue
                }

                Some(apps) = self.candidates_rx.recv() => {
                    self.handle_candidates(apps);
                    Flow::Continue
                }

                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("Command input closed");
                        commands_open = false;
                        Flow::Continue
                    }
                },

                raise = raises.recv(), if raises_open => {
                    match raise {
                        Some(RaiseSignal) => self.handle_raise(),
                        None => raises_open = false,
                    }
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Apply one presentation-layer command
    pub fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Intent(intent) => {
                if let Err(e) = self.apply_intent(intent) {
                    self.presenter.on_rejected(&e.to_string());
                }
            }
            Command::ListApps => self.request_candidates(),
            Command::Status => self.publish_state(),
            Command::Unrecognized(input) => {
                self.presenter
                    .on_rejected(&format!("Unrecognized command: {}", input));
            }
            Command::Quit => return self.request_quit(),
        }

        Flow::Continue
    }

    fn request_quit(&mut self) -> Flow {
        if self.engine.state() == SessionState::RunningLocked {
            warn!("Quit refused, session is locked");
            self.presenter
                .on_rejected("Lock mode is on; focusguard cannot be closed until the session ends");
            return Flow::Continue;
        }
        Flow::Exit
    }

    /// Apply a user intent and act on what it changed
    pub fn apply_intent(&mut self, intent: Intent) -> Result<(), CoreError> {
        let events = self.engine.apply(
            intent,
            focusguard_util::now(),
            MonotonicInstant::now(),
        )?;

        for event in events {
            self.handle_core_event(event);
        }

        // Lock requests change the snapshot without emitting an event
        self.publish_state();
        Ok(())
    }

    /// Handle one message from the enforcement task
    pub fn handle_enforcer_event(&mut self, event: EnforcerEvent) {
        let current = self
            .engine
            .current_session()
            .map(|s| &s.session_id);

        if current != Some(event.session_id()) {
            debug!(session_id = %event.session_id(), "Ignoring event from ended session");
            return;
        }

        match event {
            EnforcerEvent::Tick { remaining, .. } => self.presenter.on_tick(remaining),
            EnforcerEvent::AppBlocked { name, .. } => self.presenter.on_app_blocked(&name),
            EnforcerEvent::ExpireDue { session_id } => {
                if let Some(event) = self.engine.expire(&session_id, MonotonicInstant::now()) {
                    self.handle_core_event(event);
                    self.publish_state();
                }
            }
        }
    }

    /// List candidate apps off the event loop; the result arrives as a
    /// message handled by `handle_candidates`
    fn request_candidates(&self) {
        let catalog = self.catalog.clone();
        let tx = self.candidates_tx.clone();

        tokio::task::spawn_blocking(move || {
            let apps = catalog.list_candidate_apps();
            debug!(count = apps.len(), "Candidate apps listed");
            let _ = tx.send(apps);
        });
    }

    pub fn handle_candidates(&mut self, apps: Vec<String>) {
        self.presenter.on_candidates(&apps);
    }

    /// Receive the next finished app listing without handling it
    pub async fn next_candidates(&mut self) -> Option<Vec<String>> {
        self.candidates_rx.recv().await
    }

    /// Another launch asked this instance to come to the foreground
    pub fn handle_raise(&mut self) {
        info!("Raise requested by another instance");
        self.presenter.raise();
        self.publish_state();
    }

    fn handle_core_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::SessionStarted { session_id, .. } => {
                match self.engine.enforcement_plan() {
                    Some(plan) => {
                        self.enforcement =
                            Some(self.enforcer.spawn(plan, self.enforcer_tx.clone()));
                    }
                    None => warn!(session_id = %session_id, "Started session has no plan"),
                }
            }
            CoreEvent::SessionEnded { session_id, reason, .. } => {
                // Dropping the handle aborts the enforcement task
                if let Some(handle) = self.enforcement.take() {
                    debug!(session_id = %handle.session_id(), "Enforcement stopped");
                }
                info!(session_id = %session_id, reason = ?reason, "Focus session over");
            }
            CoreEvent::BlockListChanged { apps } => {
                self.store.save_best_effort(&apps);
            }
            CoreEvent::LockArmed | CoreEvent::LockEngaged { .. } => {
                debug!("Lock mode confirmed");
            }
            CoreEvent::DurationChanged { pending } => {
                debug!(pending_secs = pending.as_secs(), "Pending duration changed");
            }
        }
    }

    fn publish_state(&mut self) {
        let snapshot = self.snapshot();
        self.presenter.on_state_changed(&snapshot);
    }

    /// Receive the next enforcement message without handling it
    pub async fn next_enforcer_event(&mut self) -> Option<EnforcerEvent> {
        self.enforcer_rx.recv().await
    }

    /// Stop any unlocked session and persist the block list
    pub fn shutdown(&mut self) {
        info!("Shutting down focusguardd");

        if self.engine.state() == SessionState::Running
            && let Ok(event) = self.engine.stop(MonotonicInstant::now())
        {
            self.handle_core_event(event);
        }
        self.enforcement = None;

        self.store.save_best_effort(self.engine.block_list().as_slice());

        info!("Shutdown complete");
    }
}
