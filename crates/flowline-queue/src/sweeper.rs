// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiration of finished entries past their retention window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use flowline_core::{EntryId, QueueEntry};

use crate::store::QueueStore;

/// Whether a terminal entry has been idle for strictly longer than `retention`.
///
/// Active entries never expire.
pub fn is_expired(entry: &QueueEntry, now: DateTime<Utc>, retention: Duration) -> bool {
    if entry.status.is_active() {
        return false;
    }
    match (now - entry.last_updated).to_std() {
        Ok(idle) => idle > retention,
        Err(_) => false,
    }
}

/// Remove expired entries from the store, returning their ids in store order.
pub fn sweep(store: &mut QueueStore, now: DateTime<Utc>, retention: Duration) -> Vec<EntryId> {
    store
        .remove_where(|entry| is_expired(entry, now, retention))
        .into_iter()
        .map(|entry| entry.id)
        .collect()
}
