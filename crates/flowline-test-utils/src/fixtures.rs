// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission fixtures and event helpers.

use flowline_bus::QueueEvent;
use flowline_core::{AdmitRequest, DeliveryStatus};
use tokio::sync::broadcast;

/// A pending admission for `flow_id` to `recipient` on instance `i1`.
///
/// Override individual fields with struct update syntax:
///
/// ```
/// use flowline_test_utils::admit_request;
///
/// let req = flowline_core::AdmitRequest {
///     message_index: Some(1),
///     ..admit_request("f1", "5511999999999", 3)
/// };
/// assert_eq!(req.total_messages, 3);
/// ```
pub fn admit_request(flow_id: &str, recipient: &str, total_messages: u32) -> AdmitRequest {
    AdmitRequest {
        flow_id: flow_id.to_string(),
        flow_name: Some(format!("Flow {flow_id}")),
        instance_id: "i1".to_string(),
        instance_name: Some("Main instance".to_string()),
        recipient_number: recipient.to_string(),
        recipient_name: None,
        status: DeliveryStatus::Pending,
        scheduled_at: None,
        message_index: None,
        total_messages,
        trigger: None,
    }
}

/// Same as [`admit_request`] but on a specific instance.
pub fn admit_on_instance(
    flow_id: &str,
    recipient: &str,
    instance_id: &str,
    total_messages: u32,
) -> AdmitRequest {
    AdmitRequest {
        instance_id: instance_id.to_string(),
        instance_name: Some(format!("Instance {instance_id}")),
        ..admit_request(flow_id, recipient, total_messages)
    }
}

/// Take every event already buffered on `rx` without waiting.
pub fn drain_events(rx: &mut broadcast::Receiver<QueueEvent>) -> Vec<QueueEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

/// Kinds of the given events, in order.
pub fn event_kinds(events: &[QueueEvent]) -> Vec<&'static str> {
    events.iter().map(QueueEvent::kind).collect()
}
