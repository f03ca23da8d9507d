// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-zero intervals and
//! capacities, a bindable gateway address, and a known log level.

use crate::diagnostic::ConfigError;
use crate::model::FlowlineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &FlowlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.service.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        invalid(format!(
            "service.log_level `{}` must be one of: {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let tracker = &config.tracker;
    if tracker.tick_interval_secs == 0 {
        invalid("tracker.tick_interval_secs must be at least 1".to_string());
    }
    if tracker.retention_secs == 0 {
        invalid("tracker.retention_secs must be at least 1".to_string());
    }
    if tracker.history_capacity == 0 {
        invalid("tracker.history_capacity must be at least 1".to_string());
    }
    if tracker.event_capacity == 0 {
        invalid("tracker.event_capacity must be at least 1".to_string());
    }

    let gateway = &config.gateway;
    if gateway.enabled {
        let host = gateway.host.trim();
        if host.is_empty() {
            invalid("gateway.host must not be empty".to_string());
        } else {
            let is_ip = host.parse::<std::net::IpAddr>().is_ok();
            let is_hostname = host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
            if !is_ip && !is_hostname {
                invalid(format!(
                    "gateway.host `{host}` is not a valid IP address or hostname"
                ));
            }
        }
        if gateway.port == 0 {
            invalid("gateway.port must not be 0 when the gateway is enabled".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
