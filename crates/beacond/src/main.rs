//! # Beacond - Ohm Discovery Daemon
//!
//! Hosts the discovery module of an Ohm node: listens for peer beacons,
//! announces the local node, and serves the membership view over HTTP.
//!
//! ## Architecture
//! ```text
//! peers --UDP beacon--> BeaconService --> Discovery (table) --> new-node subscribers
//!                                              ^
//!                         admin API ----------+  (point query / snapshot)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod reaper;
mod routes;
mod state;
mod transport;

use config::AppConfig;
use ohm_discovery::{Discovery, NodeId};
use state::AppState;
use transport::BeaconService;

/// Ohm discovery daemon
#[derive(Parser, Debug)]
#[command(name = "beacond")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/beacond.toml")]
    config: String,

    /// Node id (overrides config)
    #[arg(long, env = "OHM_NODE_ID")]
    node_id: Option<u64>,

    /// Admin listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Beacon bind address (overrides config)
    #[arg(long, env = "BEACON_BIND_ADDR")]
    beacon_bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting Ohm beacond v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&args.config, &args)?;
    let node_id = NodeId(config.node_id);
    info!(node_id = %node_id, "Configuration loaded from {}", args.config);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let discovery = Discovery::new(
        config.discovery.stale_policy(),
        config.discovery.notification_capacity,
    );
    let (requester, request_loop) = discovery.serve_requests(config.discovery.request_capacity);
    info!(policy = ?discovery.ingestor().policy(), "Discovery module ready");

    // Beacon transport
    let beacon = Arc::new(BeaconService::new(
        config.beacon.clone(),
        node_id,
        discovery.ingestor().clone(),
    ));
    let local = config.local_availability();

    let receiver = beacon.clone();
    let receiver_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        if let Err(e) = receiver.run_receiver(receiver_shutdown).await {
            tracing::error!(error = %e, "Beacon receiver failed");
        }
    });

    let broadcaster = beacon.clone();
    let broadcaster_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        if let Err(e) = broadcaster
            .run_broadcaster(move || local.clone(), broadcaster_shutdown)
            .await
        {
            tracing::error!(error = %e, "Beacon broadcaster failed");
        }
    });

    if config.discovery.node_ttl_secs > 0 {
        let table = discovery.table().clone();
        let ttl = Duration::from_secs(config.discovery.node_ttl_secs);
        let every = Duration::from_secs(config.discovery.reap_interval_secs);
        let reaper_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            reaper::run_reaper(table, ttl, every, reaper_shutdown).await;
        });
    }

    let state = AppState::new(config.clone(), discovery, requester);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind admin listener on {}", config.listen_addr))?;
    info!("Beacond admin API listening on {}", config.listen_addr);

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    request_loop.abort();

    info!("Beacond shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
