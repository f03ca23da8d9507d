// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Flowline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Flowline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowlineConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Queue tracker scheduling and retention.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// HTTP gateway for dispatch workers and dashboards.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in log lines and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "flowline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Queue tracker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Scheduler tick interval driving sweep, sampling and estimation.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// How long a terminal entry stays visible before the sweeper drops it.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Number of throughput samples kept in the rolling history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Event channel capacity; slower subscribers lag past this many events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl TrackerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            retention_secs: default_retention_secs(),
            history_capacity: default_history_capacity(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_history_capacity() -> usize {
    10
}

fn default_event_capacity() -> usize {
    256
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Serve the HTTP gateway alongside the tracker.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3100
}
