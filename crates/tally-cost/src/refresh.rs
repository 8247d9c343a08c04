// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote pricing refresh from the LiteLLM community pricing database.
//!
//! Fetched entries land in the middle resolution tier: above the builtin
//! table, below user-registered models. A failed fetch leaves existing
//! pricing untouched.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tally_core::TallyError;
use tracing::info;

use crate::pricing::{PriceEntry, PricingTable};

/// The LiteLLM community-maintained pricing JSON.
pub const LITELLM_PRICING_URL: &str = "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// Fetch timeout for the pricing download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse raw LiteLLM JSON into price entries.
///
/// Keeps models that carry both per-token costs, converting them to
/// per-1k-token rates. Spec/sample entries and malformed rows are skipped.
fn parse_litellm_pricing(raw: &Value) -> HashMap<String, PriceEntry> {
    let mut entries = HashMap::new();
    let Some(models) = raw.as_object() else {
        return entries;
    };

    for (model, data) in models {
        if model == "sample_spec" {
            continue;
        }
        let Some(data) = data.as_object() else {
            continue;
        };
        let (Some(input_per_token), Some(output_per_token)) = (
            data.get("input_cost_per_token").and_then(Value::as_f64),
            data.get("output_cost_per_token").and_then(Value::as_f64),
        ) else {
            continue;
        };
        let provider = data
            .get("litellm_provider")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        entries.insert(
            model.clone(),
            PriceEntry {
                model: model.clone(),
                input_per_1k: input_per_token * 1000.0,
                output_per_1k: output_per_token * 1000.0,
                provider,
            },
        );
    }
    entries
}

impl PricingTable {
    /// Fetch the latest community pricing and replace the fetched tier.
    ///
    /// Returns the number of models loaded. On transport or decode failure
    /// the fetched tier is left unchanged and the error is returned.
    pub async fn refresh(&self, url: &str) -> Result<usize, TallyError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| TallyError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = client.get(url).send().await.map_err(|e| TallyError::Http {
            message: format!("pricing fetch failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TallyError::Http {
                message: format!("pricing fetch returned HTTP {status}"),
                source: None,
            });
        }

        let raw: Value = response.json().await.map_err(|e| TallyError::Http {
            message: format!("pricing payload was not valid JSON: {e}"),
            source: Some(Box::new(e)),
        })?;

        let entries = parse_litellm_pricing(&raw);
        let count = entries.len();
        self.replace_fetched(entries);
        info!(models = count, url, "refreshed pricing from remote source");
        Ok(count)
    }
}
