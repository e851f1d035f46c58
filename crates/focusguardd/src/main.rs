//! focusguardd - The focusguard service
//!
//! This is the main entry point for the focusguardd service.
//! It wires together all the components:
//! - Configuration loading
//! - Single-instance coordination
//! - Block list store
//! - Process scanner, notifier and app catalog (Linux)
//! - Console front end

use anyhow::{Context, Result};
use clap::Parser;
use focusguard_config::load_settings_or_default;
use focusguard_core::Enforcer;
use focusguard_host_linux::{DesktopNotifier, LinuxAppCatalog, SystemProcessScanner};
use focusguard_store::JsonBlockListStore;
use focusguard_util::{default_block_list_path, default_config_path};
use focusguardd::{
    ConsolePresenter, InstanceRole, Service, USAGE, claim_instance, coordination_target,
    spawn_console_reader,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// focusguardd - Blocks distracting applications for a timed focus session
#[derive(Parser, Debug)]
#[command(name = "focusguardd")]
#[command(about = "Blocks distracting applications for a timed focus session", long_about = None)]
struct Args {
    /// Settings file path (default: ~/.config/focusguard/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Block list file override (or set FOCUSGUARD_BLOCK_LIST env var)
    #[arg(short, long, env = "FOCUSGUARD_BLOCK_LIST")]
    block_list: Option<PathBuf>,

    /// Coordination port override (or set FOCUSGUARD_PORT env var)
    #[arg(short, long, env = "FOCUSGUARD_PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout belongs to the console front end
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "focusguardd starting"
    );

    // Coordinate before failing on bad settings so a redundant launch still exits cleanly
    let settings = load_settings_or_default(&args.config);
    let (port, signal_timeout) = coordination_target(args.port, settings.as_ref().ok());
    let (raise_tx, raise_rx) = mpsc::unbounded_channel();

    let raise_listener = match claim_instance(port, signal_timeout, raise_tx).await {
        InstanceRole::Redundant => return Ok(()),
        InstanceRole::Primary { listener } => listener,
    };

    let settings =
        settings.with_context(|| format!("Failed to load settings from {:?}", args.config))?;

    let block_list_path = args
        .block_list
        .or_else(|| settings.service.block_list_path.clone())
        .unwrap_or_else(default_block_list_path);
    let store = Arc::new(JsonBlockListStore::new(&block_list_path));

    info!(path = %block_list_path.display(), "Block list store initialized");

    let mut enforcer = Enforcer::new(Arc::new(SystemProcessScanner::new()));
    if settings.service.notifications {
        enforcer = enforcer.with_notifier(Arc::new(DesktopNotifier::new()));
    }

    let catalog = Arc::new(LinuxAppCatalog::new(
        settings.catalog.application_dirs.clone(),
        settings.catalog.extra_excluded.clone(),
    ));

    let service = Service::new(store, enforcer, catalog, ConsolePresenter::stdout());

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let _console = spawn_console_reader(command_tx);
    print!("{}", USAGE);

    let result = service.run(command_rx, raise_rx).await;

    // Release the coordination port before exiting
    if let Some(listener) = raise_listener {
        listener.abort();
    }
    result
}
