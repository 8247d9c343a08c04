// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, collecting every violation instead of failing fast.

use std::collections::HashSet;

use tally_core::TallyError;

use crate::model::{CacheBackendKind, TallyConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or every collected violation
/// as `TallyError::Config` values.
pub fn validate_config(config: &TallyConfig) -> Result<(), Vec<TallyError>> {
    let mut errors = Vec::new();

    if let Some(capacity) = config.cache.capacity
        && capacity == 0
    {
        errors.push(TallyError::Config(
            "cache.capacity must be at least 1".to_string(),
        ));
    }

    if config.cache.backend == CacheBackendKind::Disk
        && let Some(dir) = &config.cache.dir
        && dir.trim().is_empty()
    {
        errors.push(TallyError::Config(
            "cache.dir must not be empty when set".to_string(),
        ));
    }

    if let Some(max_cost) = config.budget.max_cost_usd
        && max_cost < 0.0
    {
        errors.push(TallyError::Config(format!(
            "budget.max_cost_usd must be non-negative, got {max_cost}"
        )));
    }

    let mut seen_models = HashSet::new();
    for entry in &config.pricing.models {
        if entry.model.trim().is_empty() {
            errors.push(TallyError::Config(
                "pricing.models entries must name a model".to_string(),
            ));
        }
        if entry.input_per_1k < 0.0 || entry.output_per_1k < 0.0 {
            errors.push(TallyError::Config(format!(
                "pricing for model '{}' must be non-negative, got input {}/1k, output {}/1k",
                entry.model, entry.input_per_1k, entry.output_per_1k
            )));
        }
        if !seen_models.insert(entry.model.as_str()) {
            errors.push(TallyError::Config(format!(
                "model '{}' is priced more than once",
                entry.model
            )));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
