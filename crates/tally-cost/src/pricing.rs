// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing table and cost calculation.
//!
//! Pricing resolves in three tiers (highest priority first):
//! 1. User-registered entries via [`PricingTable::register`]
//! 2. Remotely fetched entries via [`PricingTable::refresh`]
//! 3. The builtin table shipped with this crate (verified February 2026)
//!
//! A lookup miss across all tiers is an error, never a silent zero price.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tally_core::TallyError;
use tracing::debug;

/// Pricing for one model, in USD per 1000 tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEntry {
    /// Model identifier this entry applies to.
    pub model: String,
    /// Cost per 1000 input tokens.
    pub input_per_1k: f64,
    /// Cost per 1000 output tokens.
    pub output_per_1k: f64,
    /// Provider name (e.g. "openai", "anthropic", "custom").
    pub provider: String,
}

/// Builtin pricing data, as of February 2026.
const BUILTIN_PRICES: &[(&str, f64, f64, &str)] = &[
    // OpenAI models
    ("gpt-4o", 0.0025, 0.010, "openai"),
    ("gpt-4o-mini", 0.00015, 0.0006, "openai"),
    ("gpt-4-turbo", 0.01, 0.03, "openai"),
    ("gpt-4", 0.03, 0.06, "openai"),
    ("gpt-3.5-turbo", 0.0005, 0.0015, "openai"),
    ("o1", 0.015, 0.060, "openai"),
    ("o1-mini", 0.003, 0.012, "openai"),
    ("o3-mini", 0.0011, 0.0044, "openai"),
    // Anthropic models
    ("claude-opus-4-5", 0.015, 0.075, "anthropic"),
    ("claude-opus-4-5-20251101", 0.015, 0.075, "anthropic"),
    ("claude-sonnet-4-5", 0.003, 0.015, "anthropic"),
    ("claude-sonnet-4-5-20250929", 0.003, 0.015, "anthropic"),
    ("claude-haiku-4-5", 0.0008, 0.004, "anthropic"),
    ("claude-haiku-4-5-20251001", 0.0008, 0.004, "anthropic"),
    ("claude-3-5-sonnet-20241022", 0.003, 0.015, "anthropic"),
    ("claude-3-opus-20240229", 0.015, 0.075, "anthropic"),
    // Google models
    ("gemini-2.0-flash", 0.0, 0.0, "google"),
    ("gemini-1.5-pro", 0.00125, 0.005, "google"),
    ("gemini-1.5-flash", 0.000075, 0.0003, "google"),
];

/// Thread-safe pricing table, shared via `Arc` by every proxy and tracker.
///
/// Registration affects subsequent cost computations only; records already
/// in the ledger are never revalued.
pub struct PricingTable {
    builtin: HashMap<String, PriceEntry>,
    fetched: RwLock<HashMap<String, PriceEntry>>,
    registered: RwLock<HashMap<String, PriceEntry>>,
}

impl PricingTable {
    /// Create a table seeded with the builtin pricing data.
    pub fn new() -> Self {
        let builtin = BUILTIN_PRICES
            .iter()
            .map(|&(model, input_per_1k, output_per_1k, provider)| {
                (
                    model.to_string(),
                    PriceEntry {
                        model: model.to_string(),
                        input_per_1k,
                        output_per_1k,
                        provider: provider.to_string(),
                    },
                )
            })
            .collect();
        Self {
            builtin,
            fetched: RwLock::new(HashMap::new()),
            registered: RwLock::new(HashMap::new()),
        }
    }

    /// Create a table with no entries at all.
    pub fn empty() -> Self {
        Self {
            builtin: HashMap::new(),
            fetched: RwLock::new(HashMap::new()),
            registered: RwLock::new(HashMap::new()),
        }
    }

    /// Register or overwrite a user-tier price entry.
    ///
    /// The last registration for a given model identifier wins. Fails with
    /// [`TallyError::InvalidPrice`] if either rate is negative.
    pub fn register(
        &self,
        model: &str,
        input_per_1k: f64,
        output_per_1k: f64,
        provider: &str,
    ) -> Result<(), TallyError> {
        if input_per_1k < 0.0 || output_per_1k < 0.0 {
            return Err(TallyError::InvalidPrice {
                model: model.to_string(),
                input_per_1k,
                output_per_1k,
            });
        }
        let entry = PriceEntry {
            model: model.to_string(),
            input_per_1k,
            output_per_1k,
            provider: provider.to_string(),
        };
        self.registered
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.to_string(), entry);
        debug!(model, input_per_1k, output_per_1k, provider, "model price registered");
        Ok(())
    }

    /// Look up the effective price entry for a model.
    ///
    /// Resolution order: user-registered, then fetched, then builtin.
    pub fn lookup(&self, model: &str) -> Result<PriceEntry, TallyError> {
        if let Some(entry) = self
            .registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model)
        {
            return Ok(entry.clone());
        }
        if let Some(entry) = self
            .fetched
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model)
        {
            return Ok(entry.clone());
        }
        if let Some(entry) = self.builtin.get(model) {
            return Ok(entry.clone());
        }
        Err(TallyError::UnknownModel {
            model: model.to_string(),
        })
    }

    /// Compute the cost in USD of one call.
    ///
    /// `prompt_tokens / 1000 * input_per_1k + completion_tokens / 1000 *
    /// output_per_1k`, rounded to 6 decimal places with round-half-even so
    /// rounding bias does not accumulate across many small calls.
    pub fn cost(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Result<f64, TallyError> {
        let entry = self.lookup(model)?;
        let input_cost = prompt_tokens as f64 / 1000.0 * entry.input_per_1k;
        let output_cost = completion_tokens as f64 / 1000.0 * entry.output_per_1k;
        Ok(round_to_currency(input_cost + output_cost))
    }

    /// Merged view of all tiers, optionally filtered by provider.
    ///
    /// Registered entries shadow fetched ones, which shadow builtin ones.
    pub fn list_models(&self, provider: Option<&str>) -> HashMap<String, PriceEntry> {
        let mut merged = self.builtin.clone();
        merged.extend(
            self.fetched
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged.extend(
            self.registered
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        match provider {
            None => merged,
            Some(p) => merged.into_iter().filter(|(_, e)| e.provider == p).collect(),
        }
    }

    /// Replace the fetched tier wholesale. Used by the remote refresh.
    pub(crate) fn replace_fetched(&self, entries: HashMap<String, PriceEntry>) {
        *self
            .fetched
            .write()
            .unwrap_or_else(PoisonError::into_inner) = entries;
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to 6 decimal places, ties to even.
fn round_to_currency(value: f64) -> f64 {
    (value * 1_000_000.0).round_ties_even() / 1_000_000.0
}
