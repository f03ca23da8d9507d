// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flowline.toml` > `~/.config/flowline/flowline.toml` > `/etc/flowline/flowline.toml`
//! with environment variable overrides via `FLOWLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FlowlineConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/flowline/flowline.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "flowline.toml";

/// Path of the per-user configuration file, if a config dir is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flowline/flowline.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flowline/flowline.toml` (system-wide)
/// 3. `~/.config/flowline/flowline.toml` (user XDG config)
/// 4. `./flowline.toml` (local directory)
/// 5. `FLOWLINE_*` environment variables
pub fn load_config() -> Result<FlowlineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FlowlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlowlineConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading configuration from explicit path");
    Figment::new()
        .merge(Serialized::defaults(FlowlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let user_path = user_config_path();
    if user_path.is_none() {
        tracing::debug!("no user config directory, skipping user configuration");
    }
    Figment::new()
        .merge(Serialized::defaults(FlowlineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_path.unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `FLOWLINE_TRACKER_TICK_INTERVAL_SECS` must map to
/// `tracker.tick_interval_secs`, not `tracker.tick.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("FLOWLINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key onto its dotted config path.
fn map_env_key(key: &str) -> String {
    key.replacen("service_", "service.", 1)
        .replacen("tracker_", "tracker.", 1)
        .replacen("gateway_", "gateway.", 1)
}
