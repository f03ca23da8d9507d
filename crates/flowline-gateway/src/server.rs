// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use flowline_core::FlowlineError;
use flowline_queue::QueueTracker;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::sse;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Service name reported by `/health`.
    pub service_name: String,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The tracker every route reads from or mutates.
    pub tracker: Arc<QueueTracker>,
    /// Health state for `/health`.
    pub health: HealthState,
    /// Cancelled when the gateway stops; ends open event streams.
    pub shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(tracker: Arc<QueueTracker>, service_name: impl Into<String>) -> Self {
        Self {
            tracker,
            health: HealthState {
                start_time: Instant::now(),
                service_name: service_name.into(),
            },
            shutdown: CancellationToken::new(),
        }
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from flowline-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router.
///
/// Routes:
/// - GET /health
/// - GET /v1/queue
/// - GET /v1/queue/events (SSE)
/// - POST /v1/queue/entries
/// - PUT /v1/queue/entries/{id}/status
/// - DELETE /v1/queue/entries/{id}
pub fn router(state: GatewayState) -> Router {
    let queue_routes = Router::new()
        .route("/v1/queue", get(handlers::get_queue))
        .route("/v1/queue/events", get(sse::queue_events))
        .route("/v1/queue/entries", post(handlers::post_entry))
        .route("/v1/queue/entries/{id}", delete(handlers::delete_entry))
        .route("/v1/queue/entries/{id}/status", put(handlers::put_status));

    Router::new()
        .route("/health", get(handlers::get_health))
        .merge(queue_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind the gateway listener.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, FlowlineError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| FlowlineError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Serve the gateway on `listener` until `shutdown` is cancelled.
///
/// In-flight requests finish before this returns. SSE streams watch the
/// same token and end on cancellation, so they never hold shutdown open.
pub async fn serve(
    listener: TcpListener,
    mut state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), FlowlineError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway server listening on {addr}");
    }

    state.shutdown = shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| FlowlineError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
