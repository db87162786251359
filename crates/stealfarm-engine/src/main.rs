//! Host binary for the Stealfarm simulation core.
//!
//! Wires the farm services to their collaborators and keeps them running
//! until interrupted. A game server embeds the same wiring and drives the
//! services from its own event loop.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `stealfarm-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured store
//! 4. Build the shared context and every service
//! 5. Rebuild the plot index from the store
//! 6. Start the notification relay
//! 7. Wait for Ctrl-C, then close the store

mod error;
mod relay;

use std::path::Path;
use std::sync::Arc;

use stealfarm_core::FarmConfig;
use stealfarm_core::clock::SystemClock;
use stealfarm_core::context::FarmContext;
use stealfarm_core::economy::{MemoryEconomy, TracingInventory};
use stealfarm_core::events::{BroadcastSink, EventSink, FanoutSink, TracingSink};
use stealfarm_core::services::FarmServices;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::relay::Relay;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "stealfarm-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Configuration first: it carries the default log level.
    let config = load_config()?;

    // 2. Structured logging. RUST_LOG wins over the config file.
    let fallback = config.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(true)
        .init();

    info!(
        world_id = config.plot.world_id,
        grid_spacing = config.plot.grid_spacing,
        initial_plot_size = config.plot.initial_plot_size,
        base_steal_ratio = %config.steal.base_steal_ratio,
        crops = config.crops.len(),
        traps = config.traps.len(),
        levels = config.levels.len(),
        "stealfarm-engine starting"
    );

    // 3. Store.
    let store = stealfarm_db::connect_store(&config.store).await?;

    // 4. Context and services. Economy and inventory stand in for the
    //    host's currency and item plugins.
    let broadcast = BroadcastSink::new();
    let relay_rx = broadcast.subscribe();
    let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(TracingSink), Arc::new(broadcast)];
    let ctx = FarmContext::new(
        config,
        Arc::clone(&store),
        Arc::new(SystemClock),
        Arc::new(FanoutSink::new(sinks)),
        Arc::new(MemoryEconomy::new()),
        Arc::new(TracingInventory),
    )?;
    let services = FarmServices::new(&ctx);

    // 5. Plot index.
    let plots = services.start().await?;
    info!(plots, "Plot index loaded");

    // 6. Notifications.
    let relay = Relay::new(
        Arc::clone(&store),
        Arc::clone(&ctx.clock),
        Arc::clone(&services.presence),
    )
    .spawn(relay_rx);

    // 7. Run until interrupted.
    info!("stealfarm-engine ready");
    tokio::signal::ctrl_c().await?;
    relay.abort();
    let plots = services.allocator.plots().await.len();
    store.close().await;

    info!(plots, "stealfarm-engine shutdown complete");
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], or defaults when absent.
///
/// Environment overrides apply either way.
fn load_config() -> Result<FarmConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(FarmConfig::from_file(config_path)?)
    } else {
        Ok(FarmConfig::parse("")?)
    }
}
