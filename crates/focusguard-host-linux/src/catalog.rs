//! Discovery of applications the user may want to block

use focusguard_host_api::AppCatalog;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::System;
use tracing::{debug, warn};

/// Desktop infrastructure that makes no sense to block
const DEFAULT_EXCLUDED: &[&str] = &[
    "systemd",
    "dbus-daemon",
    "dbus-broker",
    "pipewire",
    "pipewire-pulse",
    "wireplumber",
    "pulseaudio",
    "Xorg",
    "Xwayland",
    "gnome-shell",
    "gnome-session-binary",
    "plasmashell",
    "kwin_wayland",
    "kwin_x11",
    "sway",
    "gdm",
    "sddm",
    "ssh-agent",
    "gpg-agent",
    "at-spi-bus-launcher",
    "at-spi2-registryd",
    "xdg-desktop-portal",
    "xdg-document-portal",
    "xdg-permission-store",
    "bash",
    "sh",
    "zsh",
    "fish",
    "sudo",
    "env",
    "focusguardd",
];

/// Lists installed applications from `.desktop` files plus the current
/// user's running processes, minus an exclusion set
pub struct LinuxAppCatalog {
    application_dirs: Vec<PathBuf>,
    excluded: HashSet<String>,
    include_running: bool,
}

impl LinuxAppCatalog {
    pub fn new(
        application_dirs: Vec<PathBuf>,
        extra_excluded: impl IntoIterator<Item = String>,
    ) -> Self {
        let excluded = DEFAULT_EXCLUDED
            .iter()
            .map(|s| s.to_string())
            .chain(extra_excluded)
            .collect();

        Self {
            application_dirs,
            excluded,
            include_running: true,
        }
    }

    /// Only list installed applications
    pub fn installed_only(mut self) -> Self {
        self.include_running = false;
        self
    }

    fn installed_apps(&self) -> Vec<String> {
        let mut apps = Vec::new();
        for dir in &self.application_dirs {
            collect_desktop_entries(dir, &mut apps);
        }
        apps
    }

    fn running_apps(&self) -> Vec<String> {
        let mut system = System::new();
        system.refresh_processes();

        let own_user = sysinfo::get_current_pid()
            .ok()
            .and_then(|pid| system.process(pid))
            .and_then(|p| p.user_id())
            .cloned();

        let Some(own_user) = own_user else {
            debug!("Current user unknown, skipping running processes");
            return Vec::new();
        };

        system
            .processes()
            .values()
            // Kernel threads and zombies have no executable
            .filter(|p| p.exe().is_some())
            .filter(|p| p.user_id() == Some(&own_user))
            .map(|p| p.name().to_string())
            .collect()
    }
}

impl AppCatalog for LinuxAppCatalog {
    fn list_candidate_apps(&self) -> Vec<String> {
        let mut apps: BTreeSet<String> = self.installed_apps().into_iter().collect();

        if self.include_running {
            apps.extend(self.running_apps());
        }

        apps.into_iter()
            .filter(|name| !name.is_empty() && !self.excluded.contains(name))
            .collect()
    }
}

fn collect_desktop_entries(dir: &Path, apps: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Skipping application directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_desktop_entries(&path, apps);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
            continue;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                if let Some(name) = parse_desktop_entry(&contents) {
                    apps.push(name);
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read desktop file"),
        }
    }
}

/// Executable name of a visible application entry, if any
pub fn parse_desktop_entry(contents: &str) -> Option<String> {
    let mut in_entry = false;
    let mut exec = None;
    let mut is_application = false;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        match (key.trim(), value.trim()) {
            ("Type", v) => is_application = v == "Application",
            ("NoDisplay", "true") | ("Hidden", "true") => return None,
            ("Exec", v) => exec = Some(v.to_string()),
            _ => {}
        }
    }

    if !is_application {
        return None;
    }

    exec.as_deref().and_then(exec_program_name)
}

/// Basename of the program an `Exec=` line runs.
///
/// Leading `env` and `VAR=value` assignments are skipped.
pub fn exec_program_name(exec: &str) -> Option<String> {
    let program = split_exec(exec)
        .into_iter()
        .skip_while(|arg| arg == "env" || (arg.contains('=') && !arg.starts_with('/')))
        .next()?;

    Path::new(&program)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

fn split_exec(exec: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in exec.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_basename() {
        assert_eq!(exec_program_name("/usr/bin/firefox %u").as_deref(), Some("firefox"));
        assert_eq!(exec_program_name("slack --startup").as_deref(), Some("slack"));
        assert_eq!(
            exec_program_name("env GDK_BACKEND=x11 /opt/chess/Chess %F").as_deref(),
            Some("Chess")
        );
        assert_eq!(
            exec_program_name("\"/opt/My Games/chess-app\" --fullscreen").as_deref(),
            Some("chess-app")
        );
        assert_eq!(exec_program_name("   "), None);
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let visible = "[Desktop Entry]\nType=Application\nName=Chess\nExec=gnome-chess\n";
        let hidden = "[Desktop Entry]\nType=Application\nExec=gnome-chess\nNoDisplay=true\n";
        let link = "[Desktop Entry]\nType=Link\nURL=https://example.org\n";

        assert_eq!(parse_desktop_entry(visible).as_deref(), Some("gnome-chess"));
        assert_eq!(parse_desktop_entry(hidden), None);
        assert_eq!(parse_desktop_entry(link), None);
    }

    #[test]
    fn actions_do_not_override_main_exec() {
        let contents = "[Desktop Entry]\nType=Application\nExec=firefox %u\n\n\
                        [Desktop Action new-window]\nExec=firefox-beta --new-window\n";
        assert_eq!(parse_desktop_entry(contents).as_deref(), Some("firefox"));
    }

    #[test]
    fn catalog_is_sorted_deduplicated_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("games");
        fs::create_dir(&nested).unwrap();

        let write = |path: PathBuf, exec: &str| {
            fs::write(path, format!("[Desktop Entry]\nType=Application\nExec={}\n", exec))
                .unwrap();
        };
        write(dir.path().join("slack.desktop"), "slack %U");
        write(dir.path().join("slack-beta.desktop"), "/usr/bin/slack");
        write(nested.join("chess.desktop"), "/usr/games/Chess");
        write(dir.path().join("term.desktop"), "bash");
        write(dir.path().join("mail.desktop"), "thunderbird");
        fs::write(dir.path().join("README"), "not a desktop file").unwrap();

        let catalog = LinuxAppCatalog::new(
            vec![dir.path().to_path_buf(), dir.path().join("missing")],
            vec!["thunderbird".to_string()],
        )
        .installed_only();

        assert_eq!(
            catalog.list_candidate_apps(),
            vec!["Chess".to_string(), "slack".to_string()]
        );
    }
}
