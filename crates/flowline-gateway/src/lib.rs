// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway over the queue tracker.
//!
//! Dispatch workers admit deliveries and report progress over REST;
//! dashboards read the snapshot and follow changes over SSE. The gateway
//! runs as a background task owned by [`GatewayServer`].

pub mod handlers;
pub mod server;
pub mod sse;

use std::net::SocketAddr;

use flowline_core::FlowlineError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use crate::server::{router, GatewayState, HealthState, ServerConfig};

/// Background gateway server with graceful shutdown.
pub struct GatewayServer {
    config: ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
    server_handle: Mutex<Option<JoinHandle<Result<(), FlowlineError>>>>,
}

impl GatewayServer {
    /// Shutdown is driven by the state's token, so cancelling it from
    /// outside also stops the server.
    pub fn new(config: ServerConfig, state: GatewayState) -> Self {
        let shutdown = state.shutdown.clone();
        Self {
            config,
            state,
            shutdown,
            server_handle: Mutex::new(None),
        }
    }

    /// Bind the listener and start serving in the background.
    ///
    /// Bind failures are returned here rather than from the background
    /// task. Returns the bound address, which differs from the configured
    /// one when port 0 was requested.
    pub async fn start(&self) -> Result<SocketAddr, FlowlineError> {
        let mut handle = self.server_handle.lock().await;
        if handle.is_some() {
            return Err(FlowlineError::Gateway {
                message: "gateway server already started".to_string(),
                source: None,
            });
        }

        let listener = server::bind(&self.config).await?;
        let addr = listener.local_addr().map_err(|e| FlowlineError::Gateway {
            message: format!("failed to read gateway address: {e}"),
            source: Some(Box::new(e)),
        })?;

        let state = self.state.clone();
        let shutdown = self.shutdown.clone();
        *handle = Some(tokio::spawn(server::serve(listener, state, shutdown)));

        info!(%addr, "gateway started");
        Ok(addr)
    }

    /// Signal shutdown and wait for the server task to drain.
    pub async fn shutdown(&self) -> Result<(), FlowlineError> {
        self.shutdown.cancel();
        let Some(handle) = self.server_handle.lock().await.take() else {
            return Ok(());
        };
        match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "gateway server task ended abnormally");
                Err(FlowlineError::Internal(format!("gateway task failed: {e}")))
            }
        }
    }

    /// Token cancelled when the gateway is asked to stop.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
