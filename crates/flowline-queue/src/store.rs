// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue store: the owned set of tracked delivery entries.
//!
//! Entries are kept in insertion order, which the time estimator relies on.
//! The store is plain data with no locking or event emission; `QueueTracker`
//! wraps it, serializes access, and turns outcomes into events.

use chrono::{DateTime, Utc};
use flowline_core::{AdmitRequest, DeliveryStatus, EntryId, QueueEntry};

/// Outcome of an admission.
#[derive(Debug, Clone)]
pub struct Admission {
    /// The entry as it stands after the admission.
    pub entry: QueueEntry,
    /// The request merged into an existing active entry.
    pub merged: bool,
    /// The admission left the entry in a terminal state.
    pub completed: bool,
}

/// Outcome of a status update.
#[derive(Debug, Clone)]
pub enum StatusChange {
    /// No entry with that id; it may already have been swept.
    NotFound,
    /// The entry was updated.
    Updated {
        /// The entry after the update.
        entry: QueueEntry,
        /// Set when the entry just became terminal.
        completed: bool,
    },
    /// The entry was already terminal and was left untouched.
    Absorbed(QueueEntry),
}

/// Insertion-ordered collection of queue entries.
#[derive(Debug, Default)]
pub struct QueueStore {
    entries: Vec<QueueEntry>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [QueueEntry] {
        &mut self.entries
    }

    pub fn get(&self, id: &EntryId) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Merge into the active entry for the request's (flow, recipient) pair,
    /// or insert a new entry when none is active.
    pub fn admit(&mut self, request: AdmitRequest, now: DateTime<Utc>) -> Admission {
        let completed = request.status.is_terminal();

        let active = self.entries.iter_mut().find(|e| {
            e.status.is_active() && e.matches_pair(&request.flow_id, &request.recipient_number)
        });

        if let Some(entry) = active {
            merge_into(entry, request, now);
            return Admission {
                entry: entry.clone(),
                merged: true,
                completed,
            };
        }

        let entry = QueueEntry {
            id: EntryId::generate(now),
            message_index: request
                .message_index
                .unwrap_or_default()
                .min(request.total_messages),
            scheduled_at: request.scheduled_at.unwrap_or(now),
            flow_id: request.flow_id,
            flow_name: request.flow_name.unwrap_or_default(),
            instance_id: request.instance_id,
            instance_name: request.instance_name.unwrap_or_default(),
            recipient_number: request.recipient_number,
            recipient_name: request.recipient_name,
            status: request.status,
            total_messages: request.total_messages,
            created_at: now,
            last_updated: now,
            estimated_seconds_remaining: None,
            trigger: request.trigger,
        };
        self.entries.push(entry.clone());
        Admission {
            entry,
            merged: false,
            completed,
        }
    }

    /// Update an entry's status and optionally its progress cursor.
    ///
    /// Terminal entries are absorbing: they come back unchanged as
    /// [`StatusChange::Absorbed`].
    pub fn set_status(
        &mut self,
        id: &EntryId,
        status: DeliveryStatus,
        message_index: Option<u32>,
        now: DateTime<Utc>,
    ) -> StatusChange {
        let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) else {
            return StatusChange::NotFound;
        };

        if entry.status.is_terminal() {
            return StatusChange::Absorbed(entry.clone());
        }

        entry.status = status;
        if let Some(index) = message_index {
            entry.message_index = index.min(entry.total_messages);
        }
        entry.last_updated = now;

        StatusChange::Updated {
            entry: entry.clone(),
            completed: status.is_terminal(),
        }
    }

    /// Remove an entry by id, preserving the order of the rest.
    pub fn remove(&mut self, id: &EntryId) -> Option<QueueEntry> {
        let position = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(position))
    }

    /// Remove every entry matching `predicate`, returning them in order.
    pub fn remove_where<F>(&mut self, predicate: F) -> Vec<QueueEntry>
    where
        F: Fn(&QueueEntry) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(predicate);
        self.entries = kept;
        removed
    }
}

/// Overwrite an entry with admission data; `None` fields keep old values.
fn merge_into(entry: &mut QueueEntry, request: AdmitRequest, now: DateTime<Utc>) {
    if let Some(flow_name) = request.flow_name {
        entry.flow_name = flow_name;
    }
    entry.instance_id = request.instance_id;
    if let Some(instance_name) = request.instance_name {
        entry.instance_name = instance_name;
    }
    entry.status = request.status;
    entry.total_messages = request.total_messages;
    let index = request.message_index.unwrap_or(entry.message_index);
    entry.message_index = index.min(request.total_messages);
    if let Some(name) = request.recipient_name {
        entry.recipient_name = Some(name);
    }
    if let Some(scheduled_at) = request.scheduled_at {
        entry.scheduled_at = scheduled_at;
    }
    if let Some(trigger) = request.trigger {
        entry.trigger = Some(trigger);
    }
    entry.last_updated = now;
}
