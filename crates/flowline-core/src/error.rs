// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Flowline workspace.
//!
//! The queue tracker itself never fails: absence is reported through `Option`
//! and `bool` returns. This type covers the ambient surfaces around it
//! (configuration, the HTTP gateway, process wiring).

use thiserror::Error;

/// The primary error type for fallible Flowline operations.
#[derive(Debug, Error)]
pub enum FlowlineError {
    /// Configuration errors (invalid TOML, unknown keys, failed validation).
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP gateway errors (bind failure, serve failure).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
