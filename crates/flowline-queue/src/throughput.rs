// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling throughput measurement in completed deliveries per minute.
//!
//! Completions are counted as they happen; the scheduler tick turns the count
//! into a sample once at least one tick interval has elapsed since the last
//! sample. Sampling rides on the same tick as sweeping and estimation, so a
//! tick that fires early simply skips the sample.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Bounded history of items-per-minute samples.
#[derive(Debug)]
pub struct ThroughputTracker {
    pending_completions: u64,
    history: VecDeque<f64>,
    capacity: usize,
    interval: Duration,
    last_sample_at: DateTime<Utc>,
}

impl ThroughputTracker {
    /// Create a tracker whose first sample window opens at `now`.
    pub fn new(capacity: usize, interval: Duration, now: DateTime<Utc>) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending_completions: 0,
            history: VecDeque::with_capacity(capacity),
            capacity,
            interval,
            last_sample_at: now,
        }
    }

    /// Count one delivery that reached a terminal state.
    pub fn record_completion(&mut self) {
        self.pending_completions += 1;
    }

    /// Completions counted since the last sample.
    pub fn pending_completions(&self) -> u64 {
        self.pending_completions
    }

    /// Samples from oldest to newest.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Take a sample if a full interval has elapsed since the last one.
    ///
    /// Returns the new items-per-minute value, or `None` when skipped.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Option<f64> {
        // A clock that moved backwards yields a negative delta; skip.
        let elapsed = (now - self.last_sample_at).to_std().ok()?;
        if elapsed < self.interval || elapsed.is_zero() {
            return None;
        }

        let minutes = elapsed.as_secs_f64() / 60.0;
        let per_minute = self.pending_completions as f64 / minutes;

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(per_minute);
        self.pending_completions = 0;
        self.last_sample_at = now;
        Some(per_minute)
    }

    /// Mean of the history rounded to one decimal place; `0.0` when empty.
    pub fn average_speed(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let mean = self.history.iter().sum::<f64>() / self.history.len() as f64;
        (mean * 10.0).round() / 10.0
    }
}
