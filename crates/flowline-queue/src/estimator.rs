// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion-time estimates under a single shared delivery channel.
//!
//! All active entries are treated as queued behind one outbound channel,
//! regardless of instance: an entry's ETA is the time needed for every active
//! entry ahead of it (in insertion order) plus its own remaining messages.

use chrono::{DateTime, Utc};
use flowline_core::QueueEntry;

/// Recompute `estimated_seconds_remaining` for active entries.
///
/// Skipped entirely when `items_per_minute` is not positive, leaving earlier
/// estimates in place. Returns the number of entries updated.
pub fn recompute(entries: &mut [QueueEntry], items_per_minute: f64, now: DateTime<Utc>) -> usize {
    if items_per_minute.is_nan() || items_per_minute <= 0.0 {
        return 0;
    }

    let messages_per_second = items_per_minute / 60.0;
    let mut ahead_secs = 0.0;
    let mut updated = 0;

    for entry in entries.iter_mut().filter(|e| e.status.is_active()) {
        let own_secs = f64::from(entry.remaining_messages()) / messages_per_second;
        entry.estimated_seconds_remaining = Some(ahead_secs + own_secs);
        entry.last_updated = now;
        ahead_secs += own_secs;
        updated += 1;
    }

    updated
}
