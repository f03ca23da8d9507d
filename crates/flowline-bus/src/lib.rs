// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed event channel for queue state changes.
//!
//! [`EventBus`] fans [`QueueEvent`]s out to every live subscriber in emission
//! order. There is no replay: a receiver only sees events published after it
//! subscribed, and one that falls more than `capacity` events behind gets a
//! `RecvError::Lagged` and skips ahead.

pub mod events;

pub use events::QueueEvent;
pub use tokio::sync::broadcast::error::RecvError;

use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast channel carrying [`QueueEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per lagging subscriber.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it. Publishing with
    /// nobody listening is normal and returns 0.
    pub fn publish(&self, event: QueueEvent) -> usize {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(kind, receivers, "queue event published");
                receivers
            }
            Err(_) => 0,
        }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
