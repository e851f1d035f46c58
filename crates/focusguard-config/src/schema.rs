//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Application catalog settings
    #[serde(default)]
    pub catalog: RawCatalogConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Loopback port used for single-instance coordination
    pub port: Option<u16>,

    /// Connect/send timeout for the raise signal, in milliseconds
    pub signal_timeout_ms: Option<u64>,

    /// Show a desktop notification for each killed process
    pub notifications: Option<bool>,

    /// Where the block list is persisted (`~/` is expanded)
    pub block_list_path: Option<String>,
}

/// Application catalog settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCatalogConfig {
    /// Directories scanned for `.desktop` files (`~/` is expanded)
    pub application_dirs: Option<Vec<String>>,

    /// Names hidden from the candidate list in addition to the built-in set
    #[serde(default)]
    pub extra_excluded: Vec<String>,
}
