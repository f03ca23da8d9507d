// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory tracking of flow deliveries between scheduling and completion.
//!
//! # Components
//!
//! - [`store`] - insertion-ordered entries with merge-or-create admission
//! - [`throughput`] - rolling completed-per-minute samples
//! - [`estimator`] - completion-time estimates over one shared channel
//! - [`sweeper`] - expiry of finished entries
//! - [`projection`] - the dashboard snapshot
//! - [`tracker`] - [`QueueTracker`], which ties them together behind one lock
//!   and drives the periodic maintenance tick

pub mod estimator;
pub mod projection;
pub mod store;
pub mod sweeper;
pub mod throughput;
pub mod tracker;

pub use projection::QueueSnapshot;
pub use store::Admission;
pub use tracker::{QueueTracker, TickReport, TrackerOptions};
