// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue state-change events.

use flowline_core::{EntryId, QueueEntry};
use serde::{Deserialize, Serialize};

/// A state change in the queue tracker.
///
/// Serialized with a `type` tag matching [`QueueEvent::kind`], e.g.
/// `{"type":"flow-expired","id":"1760000000000-3fa85f6457b2"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QueueEvent {
    /// A new entry was admitted.
    FlowAdded { entry: QueueEntry },
    /// An entry was merged into, had its status changed, or was otherwise modified.
    FlowUpdated { entry: QueueEntry },
    /// An entry was removed by an explicit call.
    FlowRemoved { id: EntryId },
    /// A terminal entry aged out of the retention window.
    FlowExpired { id: EntryId },
}

impl QueueEvent {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueEvent::FlowAdded { .. } => "flow-added",
            QueueEvent::FlowUpdated { .. } => "flow-updated",
            QueueEvent::FlowRemoved { .. } => "flow-removed",
            QueueEvent::FlowExpired { .. } => "flow-expired",
        }
    }

    /// Identifier of the affected entry.
    pub fn entry_id(&self) -> &EntryId {
        match self {
            QueueEvent::FlowAdded { entry } | QueueEvent::FlowUpdated { entry } => &entry.id,
            QueueEvent::FlowRemoved { id } | QueueEvent::FlowExpired { id } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_serialized_tag() {
        let event = QueueEvent::FlowExpired {
            id: EntryId::from("e-1"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert_eq!(json["id"], "e-1");
    }

    #[test]
    fn removed_event_round_trips() {
        let event = QueueEvent::FlowRemoved {
            id: EntryId::from("e-2"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"flow-removed","id":"e-2"}"#);
        let back: QueueEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry_id().as_str(), "e-2");
    }
}
