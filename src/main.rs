//! Agent runtime entry point.
//!
//! Wires the core subsystems together with constructor injection: config
//! store, filesystem watcher, event bus, module registry. Gateway adapters
//! and concrete modules register against the running core; the binary here
//! only brings the core up, logs the startup audits, and waits for a
//! termination signal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use modkit::config::{ConfigStore, ConfigWatcher};
use modkit::lifecycle::{signals, Shutdown};
use modkit::registry::ModuleRegistry;
use modkit::EventBus;

#[derive(Parser, Debug)]
#[command(name = "modkit", about = "Pluggable module runtime for a long-lived network agent")]
struct Args {
    /// Directory holding the base configuration files.
    #[arg(long, default_value = "config_df")]
    defaults_dir: PathBuf,

    /// Directory holding MERGE.-prefixed override files.
    #[arg(long, default_value = "config_merge")]
    overrides_dir: PathBuf,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "modkit=debug")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    modkit::observability::logging::init(&args.log_filter);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "modkit starting");

    let store = ConfigStore::new(&args.defaults_dir, &args.overrides_dir)?;
    let shutdown = Shutdown::new();

    // Keep the notify handle alive for the lifetime of the process.
    let _watcher = ConfigWatcher::new(Arc::clone(&store)).run(shutdown.subscribe())?;

    // Gateway adapters and modules plug in here; the core runs without them.
    let _bus = EventBus::new();
    let registry = ModuleRegistry::new(Arc::clone(&store));

    store.log_report();
    registry.log_report();

    tracing::info!(
        defaults = %args.defaults_dir.display(),
        overrides = %args.overrides_dir.display(),
        "module runtime ready"
    );

    signals::wait_for_termination(&shutdown).await;
    tracing::info!("shutdown complete");
    Ok(())
}
