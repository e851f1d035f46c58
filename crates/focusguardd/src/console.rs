//! Line-oriented console front end

use focusguard_api::{Intent, LockArm, SessionState, StateSnapshot};
use focusguard_host_api::PresentationSink;
use focusguard_util::{format_clock_time, format_countdown, format_duration};
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::Command;

pub const USAGE: &str = "\
Commands:
  add <name>[, <name>...]   add apps to the block list
  remove <name>             remove an app from the block list
  clear                     empty the block list
  apps                      list installed and running apps
  +<min> / -<min>           adjust the duration
  set <hours> <minutes>     set the duration
  reset                     reset the duration to zero
  start / stop              start or stop the focus session
  lock                      request lock mode (stop is disabled until the end)
  confirm / cancel          confirm or cancel a lock request
  status                    show the current state
  quit                      exit
";

/// Parse one input line. Blank lines and `help` yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let intent = match word {
        "add" => {
            let names: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Err("usage: add <name>[, <name>...]".into());
            }
            Intent::AddApps { names }
        }
        "remove" | "rm" => {
            if rest.is_empty() {
                return Err("usage: remove <name>".into());
            }
            Intent::RemoveApp {
                name: rest.to_string(),
            }
        }
        "clear" => Intent::ClearApps,
        "set" => {
            let mut parts = rest.split_whitespace();
            let hours = parts.next().and_then(|h| h.parse().ok());
            let minutes = parts.next().map(|m| m.parse().ok()).unwrap_or(Some(0));
            match (hours, minutes, parts.next()) {
                (Some(hours), Some(minutes), None) => {
                    Intent::SetDurationAbsolute { hours, minutes }
                }
                _ => return Err("usage: set <hours> <minutes>".into()),
            }
        }
        "reset" => Intent::ResetDuration,
        "start" => Intent::Start,
        "stop" => Intent::Stop,
        "lock" => Intent::RequestLock,
        "confirm" => Intent::ConfirmLock,
        "cancel" => Intent::CancelLockRequest,
        "apps" => return Ok(Some(Command::ListApps)),
        "status" => return Ok(Some(Command::Status)),
        "quit" | "exit" => return Ok(Some(Command::Quit)),
        "help" | "?" => return Ok(None),
        w if w.starts_with('+') || w.starts_with('-') => {
            let minutes: i64 = w
                .parse()
                .map_err(|_| format!("not a number of minutes: {}", w))?;
            Intent::AdjustDuration {
                delta_seconds: minutes.saturating_mul(60),
            }
        }
        _ => return Ok(Some(Command::Unrecognized(line.to_string()))),
    };

    Ok(Some(Command::Intent(intent)))
}

/// Read commands from stdin and forward them to the service
pub fn spawn_console_reader(commands: mpsc::UnboundedSender<Command>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read console input");
                    break;
                }
            };

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => {
                    if !line.trim().is_empty() {
                        print!("{}", USAGE);
                    }
                    continue;
                }
                Err(usage) => Command::Unrecognized(usage),
            };

            if commands.send(command).is_err() {
                break;
            }
        }

        debug!("Console reader finished");
    })
}

/// Renders service state as text
pub struct ConsolePresenter<W: Write> {
    out: W,
    /// A countdown line is on screen without a trailing newline
    mid_line: bool,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let prefix = if self.mid_line { "\n" } else { "" };
        self.mid_line = false;
        // Console output is best effort
        let _ = writeln!(self.out, "{}{}", prefix, text);
        let _ = self.out.flush();
    }
}

/// Human-readable state summary
pub fn render_snapshot(snapshot: &StateSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    let state = match snapshot.state {
        SessionState::Idle => "idle",
        SessionState::Running => "blocking",
        SessionState::RunningLocked => "blocking (locked)",
    };
    lines.push(format!("State: {}", state));

    let apps = match &snapshot.session {
        Some(session) => &session.targets,
        None => &snapshot.block_list,
    };
    if apps.is_empty() {
        lines.push("Blocked apps: none".to_string());
    } else {
        lines.push(format!("Blocked apps: {}", apps.join(", ")));
    }

    match &snapshot.session {
        Some(session) => {
            lines.push(format!(
                "Remaining: {} (until {})",
                format_countdown(session.time_remaining),
                format_clock_time(&session.deadline)
            ));
        }
        None if snapshot.pending_duration.is_zero() => {
            lines.push("Duration: not set".to_string());
        }
        None => {
            let until = snapshot
                .projected_end
                .map(|end| format!(" (until {})", format_clock_time(&end)))
                .unwrap_or_default();
            lines.push(format!(
                "Duration: {}{}",
                format_duration(snapshot.pending_duration),
                until
            ));
        }
    }

    match snapshot.lock {
        LockArm::Pending => lines.push(
            "Lock mode: once confirmed the session cannot be stopped. Type 'confirm' or 'cancel'."
                .to_string(),
        ),
        LockArm::Armed => lines.push("Lock mode: armed for the next session".to_string()),
        LockArm::Disarmed => {}
    }

    lines
}

impl<W: Write> PresentationSink for ConsolePresenter<W> {
    fn on_tick(&mut self, remaining: Duration) {
        let _ = write!(self.out, "\rRemaining {}", format_countdown(remaining));
        let _ = self.out.flush();
        self.mid_line = true;
    }

    fn on_state_changed(&mut self, snapshot: &StateSnapshot) {
        for line in render_snapshot(snapshot) {
            self.line(&line);
        }
    }

    fn on_app_blocked(&mut self, name: &str) {
        self.line(&format!("[{}] blocked!", name));
    }

    fn on_rejected(&mut self, message: &str) {
        self.line(&format!("! {}", message));
    }

    fn on_candidates(&mut self, apps: &[String]) {
        if apps.is_empty() {
            self.line("No applications found");
            return;
        }
        for app in apps {
            self.line(&format!("  {}", app));
        }
    }

    fn raise(&mut self) {
        self.line("focusguard is already running here");
    }
}
