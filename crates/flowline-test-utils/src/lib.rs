// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Flowline integration tests.
//!
//! # Components
//!
//! - [`ManualClock`] - clock that only advances on request
//! - [`admit_request`] / [`admit_on_instance`] - admission fixtures
//! - [`drain_events`] - collect buffered queue events without waiting

pub mod clock;
pub mod fixtures;

pub use clock::ManualClock;
pub use fixtures::{admit_on_instance, admit_request, drain_events, event_kinds};
