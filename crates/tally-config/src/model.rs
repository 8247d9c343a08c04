// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at load time. Every section is optional and defaults to
//! tracking with no cache and no budget caps.

use serde::{Deserialize, Serialize};

/// Top-level Tally configuration.
///
/// Loaded from `tally.toml` with `TALLY_` environment variable overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Default budget caps for guards built from config.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Custom model prices registered at startup.
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Which response-cache backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// No caching; every call reaches the provider.
    #[default]
    None,
    /// Process-lifetime in-memory cache.
    Memory,
    /// On-disk cache that survives restarts.
    Disk,
}

/// Response cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache backend selection.
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// Directory for the disk backend. Defaults to `tally-cache` under the
    /// system temp directory when unset.
    #[serde(default)]
    pub dir: Option<String>,

    /// Maximum entry count for the memory backend (LRU eviction).
    /// Unbounded when unset.
    #[serde(default)]
    pub capacity: Option<usize>,
}

/// Default budget caps.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Maximum cumulative cost in USD. `None` means no cap.
    #[serde(default)]
    pub max_cost_usd: Option<f64>,

    /// Maximum cumulative tokens. `None` means no cap.
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

/// Startup price registrations.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Models to register into the user tier at startup.
    #[serde(default)]
    pub models: Vec<ModelPriceConfig>,
}

/// One custom price entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPriceConfig {
    /// Model identifier.
    pub model: String,
    /// Cost per 1000 input tokens in USD.
    pub input_per_1k: f64,
    /// Cost per 1000 output tokens in USD.
    pub output_per_1k: f64,
    /// Provider name for attribution and filtering.
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    "custom".to_string()
}
