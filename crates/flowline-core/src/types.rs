// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Flowline workspace.
//!
//! All wire-facing types serialize with camelCase field names so the
//! dashboard sees one consistent shape for polled snapshots and pushed events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque unique identifier for a tracked queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Generate a fresh identifier: admission timestamp plus a random suffix.
    ///
    /// The millisecond prefix keeps ids roughly time-ordered; the suffix keeps
    /// concurrent admissions within the same millisecond distinct.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", now.timestamp_millis(), &suffix[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Delivery status of a queue entry.
///
/// `Pending` and `Sending` are active; `Sent` and `Failed` are terminal and
/// absorbing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    /// Admitted, first message not yet sent.
    #[default]
    Pending,
    /// Messages are going out.
    Sending,
    /// Every message was delivered.
    Sent,
    /// Delivery was abandoned.
    Failed,
}

impl DeliveryStatus {
    /// Whether the delivery is still in progress.
    pub fn is_active(self) -> bool {
        matches!(self, DeliveryStatus::Pending | DeliveryStatus::Sending)
    }

    /// Whether the delivery has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

/// One tracked attempt to deliver a flow's message sequence to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Unique identifier assigned at admission.
    pub id: EntryId,
    /// Flow whose messages are being delivered.
    pub flow_id: String,
    /// Display name of the flow.
    pub flow_name: String,
    /// Messaging instance (sender line) carrying the delivery.
    pub instance_id: String,
    /// Display name of the instance.
    pub instance_name: String,
    /// Recipient phone number.
    pub recipient_number: String,
    /// Recipient display name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    /// Current delivery status.
    pub status: DeliveryStatus,
    /// When the delivery is due to start.
    pub scheduled_at: DateTime<Utc>,
    /// 0-based progress cursor, never above `total_messages`.
    pub message_index: u32,
    /// Number of messages in the flow's sequence.
    pub total_messages: u32,
    /// When the entry was admitted.
    pub created_at: DateTime<Utc>,
    /// Last admission merge or status change.
    pub last_updated: DateTime<Utc>,
    /// Absent until the first estimate pass with a positive throughput.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_seconds_remaining: Option<f64>,
    /// Keyword or inbound message that triggered the flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl QueueEntry {
    /// Messages still to be delivered for this entry.
    pub fn remaining_messages(&self) -> u32 {
        self.total_messages.saturating_sub(self.message_index)
    }

    /// Whether this entry tracks the given (flow, recipient) pair.
    pub fn matches_pair(&self, flow_id: &str, recipient_number: &str) -> bool {
        self.flow_id == flow_id && self.recipient_number == recipient_number
    }
}

/// Admission data supplied by the dispatch worker.
///
/// Mirrors a [`QueueEntry`] minus the identifier and bookkeeping timestamps.
/// On a merge, `None` fields keep whatever the existing entry holds; a new
/// entry falls back to empty names and index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitRequest {
    /// Flow being delivered; half of the merge key.
    pub flow_id: String,
    /// Display name of the flow.
    #[serde(default)]
    pub flow_name: Option<String>,
    /// Instance carrying the delivery. Always overwrites on merge.
    pub instance_id: String,
    /// Display name of the instance.
    #[serde(default)]
    pub instance_name: Option<String>,
    /// Recipient phone number; the other half of the merge key.
    pub recipient_number: String,
    /// Recipient display name.
    #[serde(default)]
    pub recipient_name: Option<String>,
    /// Status to record. Defaults to `pending`.
    #[serde(default)]
    pub status: DeliveryStatus,
    /// Start time; admission time when absent on create.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Progress cursor, clamped to `total_messages`.
    #[serde(default)]
    pub message_index: Option<u32>,
    /// Number of messages in the sequence.
    pub total_messages: u32,
    /// Keyword or inbound message that triggered the flow.
    #[serde(default)]
    pub trigger: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_activity_partition() {
        assert!(DeliveryStatus::Pending.is_active());
        assert!(DeliveryStatus::Sending.is_active());
        assert!(DeliveryStatus::Sent.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
    }

    #[test]
    fn status_display_and_parse_are_lowercase() {
        assert_eq!(DeliveryStatus::Sending.to_string(), "sending");
        assert_eq!(
            DeliveryStatus::from_str("failed").expect("should parse"),
            DeliveryStatus::Failed
        );
        let json = serde_json::to_string(&DeliveryStatus::Sent).expect("should serialize");
        assert_eq!(json, "\"sent\"");
    }

    #[test]
    fn generated_ids_are_distinct_within_one_millisecond() {
        let now = Utc::now();
        let a = EntryId::generate(now);
        let b = EntryId::generate(now);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with(&now.timestamp_millis().to_string()));
    }

    #[test]
    fn admit_request_defaults_from_minimal_json() {
        let json = r#"{
            "flowId": "f1",
            "instanceId": "i1",
            "recipientNumber": "5511999999999",
            "totalMessages": 3
        }"#;
        let req: AdmitRequest = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(req.status, DeliveryStatus::Pending);
        assert!(req.message_index.is_none());
        assert!(req.flow_name.is_none());
        assert!(req.instance_name.is_none());
        assert!(req.scheduled_at.is_none());
        assert!(req.recipient_name.is_none());
    }

    #[test]
    fn entry_serializes_camel_case_and_skips_absent_estimate() {
        let now = Utc::now();
        let entry = QueueEntry {
            id: EntryId::from("e1"),
            flow_id: "f1".into(),
            flow_name: "Welcome".into(),
            instance_id: "i1".into(),
            instance_name: "Main".into(),
            recipient_number: "5511999999999".into(),
            recipient_name: None,
            status: DeliveryStatus::Pending,
            scheduled_at: now,
            message_index: 1,
            total_messages: 4,
            created_at: now,
            last_updated: now,
            estimated_seconds_remaining: None,
            trigger: Some("hello".into()),
        };
        let json = serde_json::to_string(&entry).expect("should serialize");
        assert!(json.contains("\"flowId\":\"f1\""));
        assert!(json.contains("\"messageIndex\":1"));
        assert!(!json.contains("estimatedSecondsRemaining"));
        assert_eq!(entry.remaining_messages(), 3);
    }
}
