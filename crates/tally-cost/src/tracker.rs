// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tracking facade: prices a call, appends it to the ledger, and
//! triggers budget checks — the single authoritative cost path for both
//! proxied and manually tracked calls.

use std::sync::Arc;

use tally_core::TallyError;

use crate::ledger::{UsageLedger, UsageRecord};
use crate::pricing::PricingTable;

/// Ledger plus pricing table, bundled for convenient threading into
/// proxies and application code.
#[derive(Clone)]
pub struct Tracker {
    ledger: Arc<UsageLedger>,
    pricing: Arc<PricingTable>,
}

impl Tracker {
    pub fn new(ledger: Arc<UsageLedger>, pricing: Arc<PricingTable>) -> Self {
        Self { ledger, pricing }
    }

    /// The shared ledger.
    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    /// The shared pricing table.
    pub fn pricing(&self) -> &Arc<PricingTable> {
        &self.pricing
    }

    /// Record usage for a call made outside any proxy.
    ///
    /// Computes the cost (failing with [`TallyError::UnknownModel`] before
    /// anything is recorded), appends to the ledger, then evaluates active
    /// budget guards. A budget breach surfaces here, with the triggering
    /// record already in the ledger.
    pub fn track(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        provider: &str,
    ) -> Result<UsageRecord, TallyError> {
        let cost_usd = self.pricing.cost(model, prompt_tokens, completion_tokens)?;
        let record = self
            .ledger
            .record(provider, model, prompt_tokens, completion_tokens, cost_usd);
        self.ledger.enforce_budgets()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{BudgetGuard, BudgetLimits};

    fn tracker() -> Tracker {
        let pricing = PricingTable::empty();
        pricing.register("m", 0.01, 0.02, "custom").unwrap();
        Tracker::new(Arc::new(UsageLedger::new()), Arc::new(pricing))
    }

    #[test]
    fn track_prices_and_records() {
        let tracker = tracker();
        let record = tracker.track("m", 1000, 500, "custom").unwrap();
        // 1000/1k * 0.01 + 500/1k * 0.02 = 0.02
        assert!((record.cost_usd - 0.02).abs() < 1e-9);
        assert_eq!(tracker.ledger().totals().calls, 1);
    }

    #[test]
    fn unknown_model_records_nothing() {
        let tracker = tracker();
        let err = tracker.track("not-priced", 10, 10, "custom").unwrap_err();
        assert!(matches!(err, TallyError::UnknownModel { .. }));
        assert_eq!(tracker.ledger().totals().calls, 0);
    }

    #[test]
    fn manual_tracking_is_budget_checked() {
        let tracker = tracker();
        let _guard = BudgetGuard::new(Arc::clone(tracker.ledger()), BudgetLimits::cost(0.03));

        tracker.track("m", 1000, 500, "custom").unwrap();
        let err = tracker.track("m", 1000, 500, "custom").unwrap_err();
        assert!(matches!(err, TallyError::BudgetExceeded { .. }));
        // Both calls are in the ledger.
        assert_eq!(tracker.ledger().totals().calls, 2);
    }
}
