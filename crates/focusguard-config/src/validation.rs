//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Longest accepted raise-signal timeout
pub const MAX_SIGNAL_TIMEOUT_MS: u64 = 30_000;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("service.port must be non-zero")]
    ZeroPort,

    #[error("service.signal_timeout_ms must be between 1 and {max}, got {value}")]
    SignalTimeoutOutOfRange { value: u64, max: u64 },

    #[error("{field} contains an empty entry")]
    EmptyValue { field: &'static str },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.service.port == Some(0) {
        errors.push(ValidationError::ZeroPort);
    }

    if let Some(timeout) = config.service.signal_timeout_ms
        && !(1..=MAX_SIGNAL_TIMEOUT_MS).contains(&timeout)
    {
        errors.push(ValidationError::SignalTimeoutOutOfRange {
            value: timeout,
            max: MAX_SIGNAL_TIMEOUT_MS,
        });
    }

    if config
        .service
        .block_list_path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        errors.push(ValidationError::EmptyValue {
            field: "service.block_list_path",
        });
    }

    if config
        .catalog
        .application_dirs
        .iter()
        .flatten()
        .any(|d| d.trim().is_empty())
    {
        errors.push(ValidationError::EmptyValue {
            field: "catalog.application_dirs",
        });
    }

    if config.catalog.extra_excluded.iter().any(|n| n.is_empty()) {
        errors.push(ValidationError::EmptyValue {
            field: "catalog.extra_excluded",
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawCatalogConfig, RawServiceConfig};

    fn raw() -> RawConfig {
        RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            catalog: RawCatalogConfig::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&raw()).is_empty());
    }

    #[test]
    fn timeout_upper_bound() {
        let mut config = raw();
        config.service.signal_timeout_ms = Some(MAX_SIGNAL_TIMEOUT_MS + 1);
        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::SignalTimeoutOutOfRange { .. }]
        ));
    }

    #[test]
    fn empty_exclusion_rejected() {
        let mut config = raw();
        config.catalog.extra_excluded = vec!["".into()];
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("extra_excluded"));
    }
}
