// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Tally usage tracker.
//!
//! Layered TOML + environment configuration with post-deserialization
//! validation. See [`model::TallyConfig`] for the full surface.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BudgetConfig, CacheBackendKind, CacheConfig, ModelPriceConfig, PricingConfig, TallyConfig,
};
pub use validation::validate_config;

use tally_core::TallyError;

/// Load from a TOML string and validate, folding every failure into one
/// `TallyError::Config`.
pub fn load_and_validate_str(toml_content: &str) -> Result<TallyConfig, TallyError> {
    let config =
        load_config_from_str(toml_content).map_err(|e| TallyError::Config(e.to_string()))?;
    validate_config(&config).map_err(|errors| {
        TallyError::Config(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;
    Ok(config)
}
