// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly helpers from configuration to running components.

use std::env;

use tally_cache::ResponseCache;
use tally_config::{BudgetConfig, CacheBackendKind, CacheConfig, PricingConfig};
use tally_core::TallyError;
use tally_cost::{BudgetLimits, PricingTable};

/// Build the configured response cache, if any.
pub fn cache_from_config(config: &CacheConfig) -> Result<Option<ResponseCache>, TallyError> {
    match config.backend {
        CacheBackendKind::None => Ok(None),
        CacheBackendKind::Memory => Ok(Some(match config.capacity {
            Some(capacity) => ResponseCache::memory_with_capacity(capacity),
            None => ResponseCache::memory(),
        })),
        CacheBackendKind::Disk => {
            let dir = match &config.dir {
                Some(dir) => dir.into(),
                None => env::temp_dir().join("tally-cache"),
            };
            Ok(Some(ResponseCache::disk(dir)?))
        }
    }
}

/// Register every configured custom model price into the user tier.
pub fn register_configured_models(
    pricing: &PricingTable,
    config: &PricingConfig,
) -> Result<(), TallyError> {
    for entry in &config.models {
        pricing.register(
            &entry.model,
            entry.input_per_1k,
            entry.output_per_1k,
            &entry.provider,
        )?;
    }
    Ok(())
}

/// Budget limits declared in configuration.
pub fn limits_from_config(config: &BudgetConfig) -> BudgetLimits {
    BudgetLimits {
        max_cost_usd: config.max_cost_usd,
        max_tokens: config.max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_config::load_config_from_str;

    #[test]
    fn none_backend_builds_no_cache() {
        let config = load_config_from_str("").unwrap();
        assert!(cache_from_config(&config.cache).unwrap().is_none());
    }

    #[test]
    fn memory_backend_builds_a_cache() {
        let config = load_config_from_str("[cache]\nbackend = \"memory\"\ncapacity = 4\n").unwrap();
        let cache = cache_from_config(&config.cache).unwrap().unwrap();
        cache.put("d", serde_json::json!({}), 0.0, 0).unwrap();
        assert!(cache.get("d").unwrap().is_some());
    }

    #[test]
    fn disk_backend_uses_the_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "[cache]\nbackend = \"disk\"\ndir = \"{}\"\n",
            dir.path().display()
        );
        let config = load_config_from_str(&toml).unwrap();
        let cache = cache_from_config(&config.cache).unwrap().unwrap();
        cache.put("d", serde_json::json!({"ok": true}), 0.01, 5).unwrap();
        assert!(dir.path().join("d.json").exists());
    }

    #[test]
    fn configured_models_land_in_the_pricing_table() {
        let toml = r#"
[[pricing.models]]
model = "acme-9000"
input_per_1k = 0.001
output_per_1k = 0.002
provider = "acme"
"#;
        let config = load_config_from_str(toml).unwrap();
        let pricing = PricingTable::empty();
        register_configured_models(&pricing, &config.pricing).unwrap();
        assert_eq!(pricing.lookup("acme-9000").unwrap().provider, "acme");
    }

    #[test]
    fn budget_limits_carry_over() {
        let config =
            load_config_from_str("[budget]\nmax_cost_usd = 1.5\nmax_tokens = 9000\n").unwrap();
        let limits = limits_from_config(&config.budget);
        assert_eq!(limits.max_cost_usd, Some(1.5));
        assert_eq!(limits.max_tokens, Some(9000));
    }
}
