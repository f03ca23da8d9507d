// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowline serve`: run the tracker (and gateway) until shutdown.

use std::sync::Arc;

use flowline_config::FlowlineConfig;
use flowline_core::FlowlineError;
use flowline_queue::{QueueTracker, TrackerOptions};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(feature = "gateway")]
use flowline_gateway::{GatewayServer, GatewayState, ServerConfig};

use crate::shutdown;

/// Initialize tracing, install signal handlers and serve until SIGINT/SIGTERM.
pub async fn run_serve(config: FlowlineConfig) -> Result<(), FlowlineError> {
    init_tracing(&config.service.log_level);
    let shutdown = shutdown::install_signal_handler();
    run_until(config, shutdown).await
}

/// Run the tracker scheduler and gateway until `shutdown` is cancelled.
async fn run_until(config: FlowlineConfig, shutdown: CancellationToken) -> Result<(), FlowlineError> {
    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        "starting flowline"
    );

    let tracker = Arc::new(QueueTracker::new(TrackerOptions::from(&config.tracker)));
    tracker.start();

    #[cfg(feature = "gateway")]
    let gateway = if config.gateway.enabled {
        let server = GatewayServer::new(
            ServerConfig {
                host: config.gateway.host.clone(),
                port: config.gateway.port,
            },
            GatewayState::new(tracker.clone(), config.service.name.clone()),
        );
        if let Err(e) = server.start().await {
            tracker.stop().await;
            return Err(e);
        }
        Some(server)
    } else {
        info!("gateway disabled by configuration");
        None
    };

    shutdown.cancelled().await;
    info!("shutdown requested");

    #[cfg(feature = "gateway")]
    if let Some(gateway) = gateway
        && let Err(e) = gateway.shutdown().await
    {
        tracing::warn!(error = %e, "gateway did not shut down cleanly");
    }

    tracker.stop().await;
    info!(tracked = tracker.len(), "flowline stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let level = log_level.trim().to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowline={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
