// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flowline_core::{AdmitRequest, DeliveryStatus, EntryId};
use flowline_queue::QueueSnapshot;
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Request body for PUT /v1/queue/entries/{id}/status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    /// New delivery status.
    pub status: DeliveryStatus,
    /// Optional progress cursor; clamped to the entry's total.
    #[serde(default)]
    pub message_index: Option<u32>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Configured service name.
    pub service: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the gateway state was created.
    pub uptime_secs: u64,
    /// Whether the maintenance tick is running.
    pub scheduler_running: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

fn not_found(id: &EntryId) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("no queue entry with id {id}"),
        }),
    )
        .into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.health.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        scheduler_running: state.tracker.is_running(),
    })
}

/// GET /v1/queue
///
/// Returns the current queue projection.
pub async fn get_queue(State(state): State<GatewayState>) -> Json<QueueSnapshot> {
    Json(state.tracker.snapshot())
}

/// POST /v1/queue/entries
///
/// Admits a delivery. Responds 201 with the new entry, or 200 with the
/// existing entry when the request merged into an active one.
pub async fn post_entry(
    State(state): State<GatewayState>,
    Json(body): Json<AdmitRequest>,
) -> Response {
    let admission = state.tracker.admit(body);
    let status = if admission.merged {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(admission.entry)).into_response()
}

/// PUT /v1/queue/entries/{id}/status
///
/// Updates status and progress. Finished entries come back unchanged.
pub async fn put_status(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Response {
    let id = EntryId(id);
    match state.tracker.set_status(&id, body.status, body.message_index) {
        Some(entry) => (StatusCode::OK, Json(entry)).into_response(),
        None => not_found(&id),
    }
}

/// DELETE /v1/queue/entries/{id}
pub async fn delete_entry(State(state): State<GatewayState>, Path(id): Path<String>) -> Response {
    let id = EntryId(id);
    if state.tracker.remove(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}
