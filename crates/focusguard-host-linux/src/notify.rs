//! Desktop notifications for blocked applications

use focusguard_host_api::NotificationSink;
use std::process::Command;
use tracing::debug;

const NOTIFY_SEND: &str = "notify-send";
const TITLE: &str = "Focus mode";

/// Shows a desktop notification through `notify-send`.
///
/// Best effort: a missing binary or a failed spawn is logged and ignored,
/// and the caller never waits for the notification to be dismissed.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            program: NOTIFY_SEND.to_string(),
        }
    }

    /// Use a different notification program with the same `<title> <body>` arguments
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification body for a killed application
pub fn blocked_message(app_name: &str) -> String {
    format!(
        "[{}] blocked!\n\nEvery minute counts.\nFinish what you were doing.",
        app_name
    )
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, app_name: &str) {
        let result = Command::new(&self.program)
            .arg(TITLE)
            .arg(blocked_message(app_name))
            .spawn();

        match result {
            Ok(mut child) => {
                // Reap in the background so no zombie is left behind
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => {
                debug!(program = %self.program, error = %e, "Notification not shown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_app() {
        let msg = blocked_message("Chess");
        assert!(msg.starts_with("[Chess] blocked!"));
    }

    #[test]
    fn missing_program_is_ignored() {
        let notifier = DesktopNotifier::with_program("/nonexistent/focusguard-notify");
        notifier.notify("Chess");
    }
}
