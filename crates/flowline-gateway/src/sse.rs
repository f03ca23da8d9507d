// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events (SSE) stream of queue changes for GET /v1/queue/events.
//!
//! Each queue event becomes one SSE event named after its kind, with the
//! JSON-encoded event as data:
//! ```text
//! event: flow-updated
//! data: {"type":"flow-updated","entry":{"id":"...","status":"sending",...}}
//!
//! event: flow-expired
//! data: {"type":"flow-expired","id":"..."}
//! ```
//!
//! Clients that fall too far behind skip the missed events; they should
//! re-fetch GET /v1/queue to resynchronize. Streams close when the gateway
//! shuts down.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use flowline_bus::{QueueEvent, RecvError};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::server::GatewayState;

/// GET /v1/queue/events
pub async fn queue_events(
    State(state): State<GatewayState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("queue event stream opened");
    let events =
        event_stream(state.tracker.subscribe()).take_until(state.shutdown.cancelled_owned());
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Turn a bus subscription into an SSE event stream.
///
/// The stream ends when the bus is dropped.
pub fn event_stream(
    rx: broadcast::Receiver<QueueEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok(to_sse_event(&event)), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "queue event subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

fn to_sse_event(event: &QueueEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|e| {
        warn!(error = %e, kind = event.kind(), "failed to encode queue event");
        format!(r#"{{"type":"{}"}}"#, event.kind())
    });
    Event::default().event(event.kind()).data(data)
}
