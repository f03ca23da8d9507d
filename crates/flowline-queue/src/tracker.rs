// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue tracker: shared state object with a stoppable maintenance tick.
//!
//! [`QueueTracker`] owns the store and throughput tracker behind one mutex.
//! Every mutation (admission, status update, removal, maintenance pass) runs
//! to completion under that lock and publishes its events before releasing
//! it, so subscribers see events in the same order the state changed.
//!
//! The scheduler started by [`QueueTracker::start`] runs one tick per
//! interval: sweep, then sample throughput, then recompute estimates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use flowline_bus::{EventBus, QueueEvent};
use flowline_config::model::TrackerConfig;
use flowline_core::{AdmitRequest, Clock, DeliveryStatus, EntryId, QueueEntry, SystemClock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::estimator;
use crate::projection::{self, QueueSnapshot};
use crate::store::{Admission, QueueStore, StatusChange};
use crate::sweeper;
use crate::throughput::ThroughputTracker;

/// Smallest tick period the scheduler will run with.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Tuning for a [`QueueTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Scheduler period, also the minimum throughput sample window.
    pub tick_interval: Duration,
    /// Idle time after which terminal entries are swept.
    pub retention: Duration,
    /// Throughput samples kept.
    pub history_capacity: usize,
    /// Event buffer per subscriber.
    pub event_capacity: usize,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for TrackerOptions {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            retention: config.retention(),
            history_capacity: config.history_capacity,
            event_capacity: config.event_capacity,
        }
    }
}

/// What one maintenance tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Finished entries swept for exceeding retention, in queue order.
    pub expired: Vec<EntryId>,
    /// Items-per-minute sample taken this tick, if the window had elapsed.
    pub sample: Option<f64>,
    /// Active entries whose estimate was recomputed.
    pub estimated: usize,
}

struct TrackerState {
    store: QueueStore,
    throughput: ThroughputTracker,
}

struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Real-time bookkeeping for in-flight flow deliveries.
pub struct QueueTracker {
    state: Mutex<TrackerState>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    options: TrackerOptions,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl QueueTracker {
    /// Create a tracker on the system clock.
    pub fn new(options: TrackerOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Create a tracker reading time from `clock`.
    pub fn with_clock(options: TrackerOptions, clock: Arc<dyn Clock>) -> Self {
        let throughput =
            ThroughputTracker::new(options.history_capacity, options.tick_interval, clock.now());
        Self {
            state: Mutex::new(TrackerState {
                store: QueueStore::new(),
                throughput,
            }),
            bus: EventBus::new(options.event_capacity),
            clock,
            options,
            scheduler: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    // Every critical section leaves the state consistent, so a panic in
    // another holder does not invalidate it.
    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Option<SchedulerHandle>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a delivery, merging into the active entry for the same
    /// (flow, recipient) pair when there is one.
    ///
    /// Emits `flow-added` for a new entry or `flow-updated` for a merge.
    pub fn admit(&self, request: AdmitRequest) -> Admission {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let admission = state.store.admit(request, now);

        if admission.completed {
            state.throughput.record_completion();
        }

        let entry = &admission.entry;
        if admission.merged {
            debug!(
                entry_id = %entry.id,
                flow_id = %entry.flow_id,
                status = %entry.status,
                message_index = entry.message_index,
                "admission merged into active entry"
            );
            self.bus.publish(QueueEvent::FlowUpdated {
                entry: entry.clone(),
            });
        } else {
            info!(
                entry_id = %entry.id,
                flow_id = %entry.flow_id,
                instance_id = %entry.instance_id,
                total_messages = entry.total_messages,
                "flow delivery admitted"
            );
            self.bus.publish(QueueEvent::FlowAdded {
                entry: entry.clone(),
            });
        }
        admission
    }

    /// Update an entry's status and optionally its progress cursor.
    ///
    /// Returns `None` when the id is unknown, which is expected once an entry
    /// has been swept. Terminal entries are returned unchanged and no event
    /// is emitted for them.
    pub fn set_status(
        &self,
        id: &EntryId,
        status: DeliveryStatus,
        message_index: Option<u32>,
    ) -> Option<QueueEntry> {
        let now = self.clock.now();
        let mut state = self.lock_state();

        match state.store.set_status(id, status, message_index, now) {
            StatusChange::NotFound => {
                debug!(entry_id = %id, %status, "status update for unknown entry ignored");
                None
            }
            StatusChange::Absorbed(entry) => {
                warn!(
                    entry_id = %id,
                    current = %entry.status,
                    requested = %status,
                    "status update on terminal entry ignored"
                );
                Some(entry)
            }
            StatusChange::Updated { entry, completed } => {
                if completed {
                    state.throughput.record_completion();
                }
                debug!(
                    entry_id = %id,
                    %status,
                    message_index = entry.message_index,
                    "entry status updated"
                );
                self.bus.publish(QueueEvent::FlowUpdated {
                    entry: entry.clone(),
                });
                Some(entry)
            }
        }
    }

    /// Remove an entry. Emits `flow-removed` and returns `true` if it existed.
    pub fn remove(&self, id: &EntryId) -> bool {
        let mut state = self.lock_state();
        match state.store.remove(id) {
            Some(_) => {
                debug!(entry_id = %id, "entry removed");
                self.bus.publish(QueueEvent::FlowRemoved { id: id.clone() });
                true
            }
            None => false,
        }
    }

    /// Clone of one entry, if tracked.
    pub fn get(&self, id: &EntryId) -> Option<QueueEntry> {
        self.lock_state().store.get(id).cloned()
    }

    /// Number of tracked entries, active and terminal.
    pub fn len(&self) -> usize {
        self.lock_state().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time projection of the queue. Does not mutate state.
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.lock_state();
        projection::project(state.store.entries(), state.throughput.average_speed())
    }

    /// Average completed deliveries per minute over the sample history.
    pub fn average_speed(&self) -> f64 {
        self.lock_state().throughput.average_speed()
    }

    /// Subscribe to state-change events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.bus.subscribe()
    }

    /// Remove terminal entries idle past the retention window.
    ///
    /// Emits `flow-expired` per removed entry.
    pub fn sweep_expired(&self) -> Vec<EntryId> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let expired = sweeper::sweep(&mut state.store, now, self.options.retention);
        for id in &expired {
            self.bus.publish(QueueEvent::FlowExpired { id: id.clone() });
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired finished entries swept");
        }
        expired
    }

    /// Take a throughput sample if a full interval has elapsed.
    pub fn sample_throughput(&self) -> Option<f64> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let sample = state.throughput.sample(now);
        if let Some(per_minute) = sample {
            debug!(
                items_per_minute = per_minute,
                average = state.throughput.average_speed(),
                "throughput sampled"
            );
        }
        sample
    }

    /// Recompute ETAs for active entries from the current average speed.
    pub fn recompute_estimates(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let speed = state.throughput.average_speed();
        estimator::recompute(state.store.entries_mut(), speed, now)
    }

    /// Run one maintenance tick: sweep, sample, estimate.
    pub fn tick(&self) -> TickReport {
        let expired = self.sweep_expired();
        let sample = self.sample_throughput();
        let estimated = self.recompute_estimates();
        debug!(
            expired = expired.len(),
            sampled = sample.is_some(),
            estimated,
            "maintenance tick complete"
        );
        TickReport {
            expired,
            sample,
            estimated,
        }
    }

    /// Start the periodic maintenance tick on the current tokio runtime.
    ///
    /// Returns `false` if the scheduler is already running. The first tick
    /// fires one interval after start.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut scheduler = self.lock_scheduler();
        if scheduler.as_ref().is_some_and(|s| !s.task.is_finished()) {
            return false;
        }

        let period = self.options.tick_interval.max(MIN_TICK_INTERVAL);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_scheduler(Arc::downgrade(self), period, cancel.clone()));
        *scheduler = Some(SchedulerHandle { cancel, task });

        info!(interval_secs = period.as_secs_f64(), "queue tracker scheduler started");
        true
    }

    /// Stop the maintenance tick and wait for the scheduler task to exit.
    ///
    /// A no-op when not running. Tracked state is left intact.
    pub async fn stop(&self) {
        let handle = self.lock_scheduler().take();
        let Some(SchedulerHandle { cancel, task }) = handle else {
            return;
        };
        cancel.cancel();
        if let Err(e) = task.await {
            warn!(error = %e, "queue tracker scheduler ended abnormally");
        }
        info!("queue tracker scheduler stopped");
    }

    /// Whether the maintenance tick is running.
    pub fn is_running(&self) -> bool {
        self.lock_scheduler()
            .as_ref()
            .is_some_and(|s| !s.task.is_finished())
    }
}

impl Drop for QueueTracker {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_scheduler().take() {
            handle.cancel.cancel();
        }
    }
}

async fn run_scheduler(tracker: Weak<QueueTracker>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(tracker) = tracker.upgrade() else { break };
                tracker.tick();
            }
        }
    }
    debug!("queue tracker scheduler loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_test_utils::{admit_request, drain_events, event_kinds, ManualClock};

    const MINUTE: Duration = Duration::from_secs(60);

    fn tracker_with_clock() -> (QueueTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let tracker = QueueTracker::with_clock(TrackerOptions::default(), clock.clone());
        (tracker, clock)
    }

    #[test]
    fn options_follow_config() {
        let config = TrackerConfig {
            tick_interval_secs: 5,
            retention_secs: 30,
            history_capacity: 4,
            event_capacity: 16,
        };
        let options = TrackerOptions::from(&config);
        assert_eq!(options.tick_interval, Duration::from_secs(5));
        assert_eq!(options.retention, Duration::from_secs(30));
        assert_eq!(options.history_capacity, 4);
        assert_eq!(options.event_capacity, 16);
    }

    #[test]
    fn admit_emits_added_then_updated() {
        let (tracker, _clock) = tracker_with_clock();
        let mut rx = tracker.subscribe();

        let first = tracker.admit(admit_request("f1", "551100", 3));
        let second = tracker.admit(AdmitRequest {
            message_index: Some(1),
            ..admit_request("f1", "551100", 3)
        });

        assert!(second.merged);
        assert_eq!(first.entry.id, second.entry.id);
        let events = drain_events(&mut rx);
        assert_eq!(event_kinds(&events), vec!["flow-added", "flow-updated"]);
    }

    #[test]
    fn set_status_unknown_returns_none_without_event() {
        let (tracker, _clock) = tracker_with_clock();
        let mut rx = tracker.subscribe();
        assert!(tracker
            .set_status(&EntryId::from("gone"), DeliveryStatus::Sent, None)
            .is_none());
        assert!(drain_events(&mut rx).is_empty());
    }

    #[test]
    fn terminal_update_is_absorbed_without_event() {
        let (tracker, _clock) = tracker_with_clock();
        let id = tracker.admit(admit_request("f1", "551100", 3)).entry.id;
        tracker.set_status(&id, DeliveryStatus::Sent, Some(3));

        let mut rx = tracker.subscribe();
        let entry = tracker
            .set_status(&id, DeliveryStatus::Pending, Some(0))
            .expect("entry still tracked");
        assert_eq!(entry.status, DeliveryStatus::Sent);
        assert_eq!(entry.message_index, 3);
        assert!(drain_events(&mut rx).is_empty());
    }

    #[test]
    fn completions_feed_next_sample() {
        let (tracker, clock) = tracker_with_clock();
        for recipient in ["1", "2", "3"] {
            let id = tracker.admit(admit_request("f1", recipient, 1)).entry.id;
            tracker.set_status(&id, DeliveryStatus::Sent, Some(1));
        }
        // Absorbed update must not count twice.
        let id = tracker.admit(admit_request("f1", "4", 1)).entry.id;
        tracker.set_status(&id, DeliveryStatus::Failed, None);
        tracker.set_status(&id, DeliveryStatus::Sent, None);

        clock.advance(MINUTE);
        assert_eq!(tracker.sample_throughput(), Some(4.0));
        assert_eq!(tracker.average_speed(), 4.0);
    }

    #[test]
    fn merge_into_terminal_status_counts_completion() {
        let (tracker, clock) = tracker_with_clock();
        tracker.admit(admit_request("f1", "1", 2));
        tracker.admit(AdmitRequest {
            status: DeliveryStatus::Sent,
            message_index: Some(2),
            ..admit_request("f1", "1", 2)
        });
        clock.advance(MINUTE);
        assert_eq!(tracker.sample_throughput(), Some(1.0));
    }

    #[test]
    fn remove_reports_whether_deleted() {
        let (tracker, _clock) = tracker_with_clock();
        let id = tracker.admit(admit_request("f1", "1", 1)).entry.id;
        let mut rx = tracker.subscribe();

        assert!(tracker.remove(&id));
        assert!(!tracker.remove(&id));
        let events = drain_events(&mut rx);
        assert_eq!(events, vec![QueueEvent::FlowRemoved { id }]);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let (tracker, _clock) = tracker_with_clock();
        tracker.admit(admit_request("f1", "1", 2));
        let mut rx = tracker.subscribe();
        let a = tracker.snapshot();
        let b = tracker.snapshot();
        assert_eq!(a, b);
        assert!(drain_events(&mut rx).is_empty());
    }

    #[test]
    fn tick_runs_sweep_sample_estimate_in_order() {
        let (tracker, clock) = tracker_with_clock();
        let done = tracker.admit(admit_request("f1", "1", 1)).entry.id;
        tracker.set_status(&done, DeliveryStatus::Sent, Some(1));
        clock.advance(Duration::from_secs(61 * 60));

        let waiting = tracker.admit(admit_request("f1", "2", 3)).entry.id;
        let report = tracker.tick();

        assert_eq!(report.expired, vec![done]);
        // One completion over 61 minutes.
        let sample = report.sample.expect("window elapsed");
        assert!((sample - 1.0 / 61.0).abs() < 1e-9);
        // Rounded average is 0.0, so the estimate pass is skipped.
        assert_eq!(report.estimated, 0);
        assert!(tracker
            .get(&waiting)
            .unwrap()
            .estimated_seconds_remaining
            .is_none());
    }

    #[test]
    fn estimates_written_once_speed_is_positive() {
        let (tracker, clock) = tracker_with_clock();
        for recipient in 0..30 {
            let id = tracker.admit(admit_request("f1", &recipient.to_string(), 1)).entry.id;
            tracker.set_status(&id, DeliveryStatus::Sent, Some(1));
        }
        let a = tracker.admit(admit_request("f2", "a", 3)).entry.id;
        let b = tracker.admit(admit_request("f2", "b", 2)).entry.id;

        clock.advance(MINUTE);
        let report = tracker.tick();
        assert_eq!(report.sample, Some(30.0));
        assert_eq!(report.estimated, 2);
        assert_eq!(tracker.get(&a).unwrap().estimated_seconds_remaining, Some(6.0));
        assert_eq!(tracker.get(&b).unwrap().estimated_seconds_remaining, Some(10.0));
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_is_clean() {
        let tracker = Arc::new(QueueTracker::new(TrackerOptions::default()));
        assert!(!tracker.is_running());
        assert!(tracker.start());
        assert!(!tracker.start());
        assert!(tracker.is_running());

        tracker.stop().await;
        assert!(!tracker.is_running());
        // Stopping twice is harmless, and the tracker can be restarted.
        tracker.stop().await;
        assert!(tracker.start());
        tracker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_tick_expires_finished_entries() {
        let clock = Arc::new(ManualClock::new());
        let tracker = Arc::new(QueueTracker::with_clock(
            TrackerOptions::default(),
            clock.clone(),
        ));
        let id = tracker.admit(admit_request("f1", "1", 1)).entry.id;
        tracker.set_status(&id, DeliveryStatus::Sent, Some(1));
        clock.advance(Duration::from_secs(61 * 60));

        let mut rx = tracker.subscribe();
        tracker.start();

        // Paused time auto-advances to the first tick while we wait.
        let event = rx.recv().await.expect("expired event");
        assert_eq!(event, QueueEvent::FlowExpired { id });
        assert!(tracker.is_empty());

        tracker.stop().await;
    }
}
