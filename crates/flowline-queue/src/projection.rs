// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only status projection over the queue.

use std::collections::HashSet;

use flowline_core::QueueEntry;
use serde::Serialize;

/// Point-in-time view of the queue, as served to dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Number of active entries.
    pub active_queues: usize,
    /// Distinct instances with at least one active entry.
    pub instances_in_use: usize,
    /// Messages still to send across all active entries.
    pub total_messages_queued: u64,
    /// Average completed deliveries per minute.
    pub processing_speed: f64,
    /// Active entries in insertion order.
    pub active_flows: Vec<QueueEntry>,
    /// Every entry, active before terminal, most recently updated first.
    pub queued_flows: Vec<QueueEntry>,
}

/// Project the entries (in insertion order) into a [`QueueSnapshot`].
pub fn project(entries: &[QueueEntry], processing_speed: f64) -> QueueSnapshot {
    let active_flows: Vec<QueueEntry> = entries
        .iter()
        .filter(|e| e.status.is_active())
        .cloned()
        .collect();

    let instances_in_use = active_flows
        .iter()
        .map(|e| e.instance_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let total_messages_queued = active_flows
        .iter()
        .map(|e| u64::from(e.remaining_messages()))
        .sum();

    let mut queued_flows = entries.to_vec();
    queued_flows.sort_by(|a, b| {
        b.status
            .is_active()
            .cmp(&a.status.is_active())
            .then_with(|| b.last_updated.cmp(&a.last_updated))
    });

    QueueSnapshot {
        active_queues: active_flows.len(),
        instances_in_use,
        total_messages_queued,
        processing_speed,
        active_flows,
        queued_flows,
    }
}
