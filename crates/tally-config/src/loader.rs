// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier): compiled defaults, the user XDG
//! config (`~/.config/tally/tally.toml`), the working-directory
//! `tally.toml`, then `TALLY_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TallyConfig;

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tally/tally.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tally.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file or env lookup).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider.
///
/// Uses explicit `map()` rather than `Env::split("_")` so that key names
/// containing underscores stay intact: `TALLY_BUDGET_MAX_COST_USD` maps to
/// `budget.max_cost_usd`, not `budget.max.cost.usd`.
fn env_provider() -> Env {
    Env::prefixed("TALLY_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("cache_", "cache.", 1)
            .replacen("budget_", "budget.", 1)
            .replacen("pricing_", "pricing.", 1);
        mapped.into()
    })
}
