//! Default paths for focusguard components
//!
//! Paths are user-writable by default:
//! - Settings: `$XDG_CONFIG_HOME/focusguard/config.toml` or `~/.config/focusguard/config.toml`
//! - Block list: `~/.focus_mode_config.json`

use std::path::PathBuf;

/// Application subdirectory name
const APP_DIR: &str = "focusguard";

/// Settings filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Block list filename within the home directory
const BLOCK_LIST_FILENAME: &str = ".focus_mode_config.json";

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Get the default settings file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/focusguard/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/focusguard/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    home_dir().join(".config").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default block list path, `~/.focus_mode_config.json`.
///
/// The `FOCUSGUARD_BLOCK_LIST` override is applied by the daemon's argument
/// parsing, not here.
pub fn default_block_list_path() -> PathBuf {
    home_dir().join(BLOCK_LIST_FILENAME)
}

/// Expand a leading `~/` against the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_focusguard() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("focusguard"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn block_list_path_is_hidden_json_file() {
        let path = default_block_list_path();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            ".focus_mode_config.json"
        );
    }

    #[test]
    fn expand_home_only_touches_tilde_prefix() {
        assert_eq!(expand_home("/etc/x"), PathBuf::from("/etc/x"));
        assert_eq!(expand_home("~/apps"), home_dir().join("apps"));
        assert_eq!(expand_home("~"), home_dir());
    }
}
