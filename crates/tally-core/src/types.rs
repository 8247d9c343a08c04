// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common usage types shared across the Tally workspace.

use serde::{Deserialize, Serialize};

/// Normalized usage fields extracted from one raw provider response.
///
/// Produced by a [`crate::UsageExtractor`]; consumed by the pricing and
/// ledger layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedUsage {
    /// Model identifier reported by the provider.
    pub model: String,
    /// Number of prompt/input tokens.
    pub prompt_tokens: u64,
    /// Number of completion/output tokens.
    pub completion_tokens: u64,
}

impl ExtractedUsage {
    /// Prompt plus completion tokens.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Aggregate usage counters.
///
/// This is the shape of the ledger's overall and per-provider totals, and
/// of budget-guard baselines and deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    /// Total prompt/input tokens.
    pub prompt_tokens: u64,
    /// Total completion/output tokens.
    pub completion_tokens: u64,
    /// Total tokens (prompt + completion).
    pub total_tokens: u64,
    /// Total cost in USD.
    pub cost_usd: f64,
    /// Number of tracked calls.
    pub calls: u64,
}

impl UsageTotals {
    /// Fold one tracked call into these totals.
    pub fn add_call(&mut self, prompt_tokens: u64, completion_tokens: u64, cost_usd: f64) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.total_tokens += prompt_tokens + completion_tokens;
        self.cost_usd += cost_usd;
        self.calls += 1;
    }

    /// Difference `self - baseline`, clamped at zero per field.
    ///
    /// A ledger reset racing an open budget scope can make the baseline
    /// larger than the current totals; the delta then reads as zero rather
    /// than underflowing.
    pub fn saturating_delta(&self, baseline: &UsageTotals) -> UsageTotals {
        UsageTotals {
            prompt_tokens: self.prompt_tokens.saturating_sub(baseline.prompt_tokens),
            completion_tokens: self
                .completion_tokens
                .saturating_sub(baseline.completion_tokens),
            total_tokens: self.total_tokens.saturating_sub(baseline.total_tokens),
            cost_usd: (self.cost_usd - baseline.cost_usd).max(0.0),
            calls: self.calls.saturating_sub(baseline.calls),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_call_updates_every_field() {
        let mut totals = UsageTotals::default();
        totals.add_call(100, 50, 0.25);
        totals.add_call(200, 100, 0.50);

        assert_eq!(totals.prompt_tokens, 300);
        assert_eq!(totals.completion_tokens, 150);
        assert_eq!(totals.total_tokens, 450);
        assert!((totals.cost_usd - 0.75).abs() < 1e-12);
        assert_eq!(totals.calls, 2);
    }

    #[test]
    fn saturating_delta_clamps_at_zero() {
        let mut baseline = UsageTotals::default();
        baseline.add_call(1000, 500, 1.0);
        let current = UsageTotals::default();

        let delta = current.saturating_delta(&baseline);
        assert_eq!(delta.total_tokens, 0);
        assert_eq!(delta.calls, 0);
        assert_eq!(delta.cost_usd, 0.0);
    }

    #[test]
    fn saturating_delta_measures_growth() {
        let mut baseline = UsageTotals::default();
        baseline.add_call(100, 50, 0.10);
        let mut current = baseline;
        current.add_call(400, 200, 0.40);

        let delta = current.saturating_delta(&baseline);
        assert_eq!(delta.prompt_tokens, 400);
        assert_eq!(delta.completion_tokens, 200);
        assert_eq!(delta.total_tokens, 600);
        assert!((delta.cost_usd - 0.40).abs() < 1e-12);
        assert_eq!(delta.calls, 1);
    }

    #[test]
    fn extracted_usage_total() {
        let usage = ExtractedUsage {
            model: "gpt-4o".to_string(),
            prompt_tokens: 120,
            completion_tokens: 30,
        };
        assert_eq!(usage.total_tokens(), 150);
    }
}
