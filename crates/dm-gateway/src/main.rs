//! Direct-message gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p dm-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use dm_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting DM Gateway Server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.gateway.port,
        heartbeat_interval_ms = config.gateway.heartbeat_interval_ms,
        "Configuration loaded"
    );

    dm_gateway::run(config).await?;

    Ok(())
}
