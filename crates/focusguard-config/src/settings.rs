//! Validated settings structures

use crate::schema::{RawCatalogConfig, RawConfig, RawServiceConfig};
use focusguard_util::expand_home;
use std::path::PathBuf;
use std::time::Duration;

/// Loopback port claimed by the primary instance
pub const DEFAULT_COORDINATION_PORT: u16 = 47200;

/// Default raise-signal connect/send timeout
pub const DEFAULT_SIGNAL_TIMEOUT: Duration = Duration::from_secs(3);

/// Validated settings ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceSettings::from_raw(raw.service),
            catalog: CatalogSettings::from_raw(raw.catalog),
        }
    }
}

/// Service settings
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub port: u16,
    pub signal_timeout: Duration,
    pub notifications: bool,
    /// None means the default path (or the env/CLI override) is used
    pub block_list_path: Option<PathBuf>,
}

impl ServiceSettings {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            port: raw.port.unwrap_or(DEFAULT_COORDINATION_PORT),
            signal_timeout: raw
                .signal_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SIGNAL_TIMEOUT),
            notifications: raw.notifications.unwrap_or(true),
            block_list_path: raw.block_list_path.as_deref().map(expand_home),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// Application catalog settings
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub application_dirs: Vec<PathBuf>,
    pub extra_excluded: Vec<String>,
}

impl CatalogSettings {
    fn from_raw(raw: RawCatalogConfig) -> Self {
        let application_dirs = match raw.application_dirs {
            Some(dirs) => dirs.iter().map(|d| expand_home(d)).collect(),
            None => default_application_dirs(),
        };

        Self {
            application_dirs,
            extra_excluded: raw.extra_excluded,
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self::from_raw(RawCatalogConfig::default())
    }
}

fn default_application_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/share/applications"),
        expand_home("~/.local/share/applications"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_dirs() {
        let catalog = CatalogSettings::default();
        assert_eq!(catalog.application_dirs.len(), 2);
        assert_eq!(
            catalog.application_dirs[0],
            PathBuf::from("/usr/share/applications")
        );
        assert!(catalog.extra_excluded.is_empty());
    }

    #[test]
    fn default_service_settings() {
        let service = ServiceSettings::default();
        assert_eq!(service.port, DEFAULT_COORDINATION_PORT);
        assert_eq!(service.signal_timeout, DEFAULT_SIGNAL_TIMEOUT);
        assert!(service.block_list_path.is_none());
    }
}
