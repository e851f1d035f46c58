//! Settings validation CLI tool
//!
//! Validates a focusguard settings file and reports any errors.

use focusguard_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a focusguard settings file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match focusguard_config::load_settings(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", focusguard_config::CURRENT_CONFIG_VERSION);
            println!("  Coordination port: {}", settings.service.port);
            println!(
                "  Signal timeout: {}ms",
                settings.service.signal_timeout.as_millis()
            );
            println!("  Notifications: {}", settings.service.notifications);
            if let Some(path) = &settings.service.block_list_path {
                println!("  Block list: {}", path.display());
            }
            println!("  Application dirs:");
            for dir in &settings.catalog.application_dirs {
                println!("    - {}", dir.display());
            }
            if !settings.catalog.extra_excluded.is_empty() {
                println!("  Extra exclusions: {}", settings.catalog.extra_excluded.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                focusguard_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                focusguard_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                focusguard_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                focusguard_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        focusguard_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
