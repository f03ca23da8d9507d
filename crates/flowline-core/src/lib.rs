// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Flowline.
//!
//! Provides the error type, the queue entry domain model, and the clock seam
//! used by the tracker and its collaborators.

pub mod clock;
pub mod error;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::FlowlineError;
pub use types::{AdmitRequest, DeliveryStatus, EntryId, QueueEntry};
