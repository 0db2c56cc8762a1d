//! Cluster router daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     bootstrap node ──▶ discovery ──▶ ConnectionRegistry ◀── select() ── callers
//!                                            ▲
//!                                            │ add / remove
//!     poll tick ──▶ TopologyPoller ──▶ ChangeFilter ──▶ mpsc ──▶ TopologyManager
//! ```
//!
//! Runs the router against a live cluster, keeps its endpoint table current and
//! optionally exposes it through the admin API until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use cluster_router::admin::setup_admin_router;
use cluster_router::config::load_config;
use cluster_router::endpoint::HttpConnector;
use cluster_router::lifecycle::signals::wait_for_shutdown_signal;
use cluster_router::observability::{logging, metrics};
use cluster_router::{ClusterRouter, RouterConfig};

#[derive(Parser)]
#[command(name = "cluster-router")]
#[command(about = "Client-side router for a dynamic database cluster", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cluster-router starting");

    tracing::info!(
        bootstrap = %config.bootstrap.address,
        strategy = ?config.balancer.strategy,
        topology_enabled = config.topology.enabled,
        poll_interval_ms = config.topology.poll_interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let connector = HttpConnector::new(
        config.endpoint.clone(),
        Duration::from_millis(config.bootstrap.connect_timeout_ms),
    );
    let router = Arc::new(ClusterRouter::connect(config.clone(), connector).await?);

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let app = setup_admin_router(router.clone(), &config.admin.api_key);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    wait_for_shutdown_signal().await;

    router.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
