// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped budget enforcement over a shared usage ledger.
//!
//! A [`BudgetGuard`] snapshots the ledger totals on entry and registers
//! itself with the ledger; every subsequent record triggers a delta check
//! against the guard's own baseline. Crossing a cap fails the triggering
//! call with `BudgetExceeded` or `TokenLimitReached` — the call that
//! crossed the line is already in the ledger and is not undone. A
//! `tracing::warn` fires at 80% of either cap before any hard failure.
//!
//! Guards nest: each enforces its own limits against its own baseline, so
//! an inner breach does not trip an outer guard. Dropping the guard
//! deregisters it on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tally_core::{TallyError, UsageTotals};
use tracing::warn;

use crate::ledger::UsageLedger;

static NEXT_GUARD_ID: AtomicU64 = AtomicU64::new(1);

/// Caller-declared thresholds for one budget scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetLimits {
    /// Maximum cumulative cost in USD within the scope. `None` = no cap.
    pub max_cost_usd: Option<f64>,
    /// Maximum cumulative tokens within the scope. `None` = no cap.
    pub max_tokens: Option<u64>,
}

impl BudgetLimits {
    /// A cost-only limit.
    pub fn cost(max_cost_usd: f64) -> Self {
        Self {
            max_cost_usd: Some(max_cost_usd),
            max_tokens: None,
        }
    }

    /// A token-only limit.
    pub fn tokens(max_tokens: u64) -> Self {
        Self {
            max_cost_usd: None,
            max_tokens: Some(max_tokens),
        }
    }
}

/// Shared state of one active guard, held by the guard and by the ledger's
/// registry.
pub(crate) struct BudgetState {
    pub(crate) id: u64,
    limits: BudgetLimits,
    baseline: UsageTotals,
    exceeded: AtomicBool,
}

impl BudgetState {
    /// Check the delta since this guard's baseline against its limits.
    ///
    /// Cost is checked before tokens; the checks are independent and either
    /// can trigger. Once a cap is crossed the guard is marked exceeded
    /// (terminal until scope exit) and keeps failing subsequent checks.
    pub(crate) fn check(&self, current: &UsageTotals) -> Result<(), TallyError> {
        let delta = current.saturating_delta(&self.baseline);

        if let Some(max_cost) = self.limits.max_cost_usd {
            if delta.cost_usd > max_cost {
                self.exceeded.store(true, Ordering::Relaxed);
                return Err(TallyError::BudgetExceeded {
                    spent_usd: delta.cost_usd,
                    limit_usd: max_cost,
                });
            }
            if max_cost > 0.0 && delta.cost_usd >= max_cost * 0.8 {
                warn!(
                    spent_usd = delta.cost_usd,
                    limit_usd = max_cost,
                    "approaching budget cap (80%+)"
                );
            }
        }

        if let Some(max_tokens) = self.limits.max_tokens {
            if delta.total_tokens > max_tokens {
                self.exceeded.store(true, Ordering::Relaxed);
                return Err(TallyError::TokenLimitReached {
                    used_tokens: delta.total_tokens,
                    limit_tokens: max_tokens,
                });
            }
            if max_tokens > 0 && delta.total_tokens >= max_tokens / 5 * 4 {
                warn!(
                    used_tokens = delta.total_tokens,
                    limit_tokens = max_tokens,
                    "approaching token cap (80%+)"
                );
            }
        }

        Ok(())
    }
}

/// A scoped budget enforcement unit.
///
/// Active from construction until drop. While active, every record on the
/// shared ledger is checked against this guard's limits.
pub struct BudgetGuard {
    ledger: Arc<UsageLedger>,
    state: Arc<BudgetState>,
}

impl BudgetGuard {
    /// Open a budget scope: snapshot the ledger totals as baseline and
    /// register with the ledger.
    pub fn new(ledger: Arc<UsageLedger>, limits: BudgetLimits) -> Self {
        let state = Arc::new(BudgetState {
            id: NEXT_GUARD_ID.fetch_add(1, Ordering::Relaxed),
            limits,
            baseline: ledger.totals(),
            exceeded: AtomicBool::new(false),
        });
        ledger.register_guard(Arc::clone(&state));
        Self { ledger, state }
    }

    /// Usage accumulated since this scope opened.
    pub fn current_usage(&self) -> UsageTotals {
        self.ledger.totals().saturating_delta(&self.state.baseline)
    }

    /// Budget left in USD, if a cost cap is set. Never negative.
    pub fn remaining_budget(&self) -> Option<f64> {
        self.state
            .limits
            .max_cost_usd
            .map(|max| (max - self.current_usage().cost_usd).max(0.0))
    }

    /// Tokens left, if a token cap is set.
    pub fn remaining_tokens(&self) -> Option<u64> {
        self.state
            .limits
            .max_tokens
            .map(|max| max.saturating_sub(self.current_usage().total_tokens))
    }

    /// Whether a threshold check has failed in this scope.
    pub fn is_exceeded(&self) -> bool {
        self.state.exceeded.load(Ordering::Relaxed)
    }

    /// Re-check this guard's limits against the current ledger state.
    pub fn check(&self) -> Result<(), TallyError> {
        self.state.check(&self.ledger.totals())
    }
}

impl Drop for BudgetGuard {
    fn drop(&mut self) {
        self.ledger.deregister_guard(self.state.id);
    }
}

/// Run `f` inside a budget scope.
///
/// The wrap-a-callable convenience over [`BudgetGuard`]: opens the scope,
/// awaits the closure, performs a final check on success, and releases the
/// guard on every exit path. Budget breaches during tracked calls inside
/// `f` surface immediately through those calls' errors; `f`'s own error
/// otherwise propagates unchanged.
pub async fn with_budget<F, Fut, T>(
    ledger: Arc<UsageLedger>,
    limits: BudgetLimits,
    f: F,
) -> Result<T, TallyError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, TallyError>>,
{
    let guard = BudgetGuard::new(ledger, limits);
    let value = f().await?;
    guard.check()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(ledger: &UsageLedger, tokens: u64, cost: f64) -> Result<(), TallyError> {
        ledger.record("p", "m", tokens / 2, tokens - tokens / 2, cost);
        ledger.enforce_budgets()
    }

    #[test]
    fn cost_cap_trips_at_the_crossing_call() {
        let ledger = Arc::new(UsageLedger::new());
        let guard = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::cost(0.10));

        assert!(track(&ledger, 100, 0.04).is_ok());
        assert!(track(&ledger, 100, 0.05).is_ok());
        let err = track(&ledger, 100, 0.03).unwrap_err();
        match err {
            TallyError::BudgetExceeded {
                spent_usd,
                limit_usd,
            } => {
                assert!((spent_usd - 0.12).abs() < 1e-9);
                assert!((limit_usd - 0.10).abs() < 1e-12);
            }
            other => panic!("expected BudgetExceeded, got {other}"),
        }
        assert!(guard.is_exceeded());
        // The triggering call is not undone.
        assert_eq!(ledger.totals().calls, 3);
        assert!((ledger.totals().cost_usd - 0.12).abs() < 1e-9);
    }

    #[test]
    fn token_cap_trips_independently() {
        let ledger = Arc::new(UsageLedger::new());
        let _guard = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::tokens(1000));

        assert!(track(&ledger, 400, 0.0).is_ok());
        assert!(track(&ledger, 400, 0.0).is_ok());
        let err = track(&ledger, 400, 0.0).unwrap_err();
        match err {
            TallyError::TokenLimitReached {
                used_tokens,
                limit_tokens,
            } => {
                assert_eq!(used_tokens, 1200);
                assert_eq!(limit_tokens, 1000);
            }
            other => panic!("expected TokenLimitReached, got {other}"),
        }
    }

    #[test]
    fn usage_at_exactly_the_cap_is_allowed() {
        let ledger = Arc::new(UsageLedger::new());
        let _guard = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::tokens(1000));
        assert!(track(&ledger, 1000, 0.0).is_ok());
        assert!(track(&ledger, 1, 0.0).is_err());
    }

    #[test]
    fn baseline_excludes_usage_before_the_scope() {
        let ledger = Arc::new(UsageLedger::new());
        ledger.record("p", "m", 500, 500, 5.0);

        let guard = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::cost(0.10));
        assert!(track(&ledger, 10, 0.05).is_ok());
        assert!((guard.current_usage().cost_usd - 0.05).abs() < 1e-12);
        assert_eq!(guard.current_usage().calls, 1);
    }

    #[test]
    fn nested_guards_enforce_independently() {
        let ledger = Arc::new(UsageLedger::new());
        let outer = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::cost(1.00));
        let inner = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::cost(0.05));

        let err = track(&ledger, 100, 0.06).unwrap_err();
        assert!(matches!(err, TallyError::BudgetExceeded { .. }));
        assert!(inner.is_exceeded());
        assert!(!outer.is_exceeded());

        drop(inner);
        // The outer guard's own delta is still below its cap.
        assert!(track(&ledger, 100, 0.10).is_ok());
        assert!(!outer.is_exceeded());
    }

    #[test]
    fn drop_deregisters_the_guard() {
        let ledger = Arc::new(UsageLedger::new());
        {
            let _guard = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::cost(0.01));
            assert!(track(&ledger, 10, 0.02).is_err());
        }
        // Scope closed: records are unchecked again.
        assert!(track(&ledger, 10, 0.02).is_ok());
    }

    #[test]
    fn remaining_budget_and_tokens_report_headroom() {
        let ledger = Arc::new(UsageLedger::new());
        let guard = BudgetGuard::new(
            Arc::clone(&ledger),
            BudgetLimits {
                max_cost_usd: Some(0.10),
                max_tokens: Some(1000),
            },
        );
        track(&ledger, 400, 0.04).unwrap();

        assert!((guard.remaining_budget().unwrap() - 0.06).abs() < 1e-12);
        assert_eq!(guard.remaining_tokens().unwrap(), 600);

        let unlimited = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::default());
        assert!(unlimited.remaining_budget().is_none());
        assert!(unlimited.remaining_tokens().is_none());
    }

    #[test]
    fn reset_mid_scope_clamps_delta_at_zero() {
        let ledger = Arc::new(UsageLedger::new());
        ledger.record("p", "m", 100, 100, 1.0);
        let guard = BudgetGuard::new(Arc::clone(&ledger), BudgetLimits::cost(0.10));

        ledger.reset();
        let usage = guard.current_usage();
        assert_eq!(usage.total_tokens, 0);
        assert_eq!(usage.cost_usd, 0.0);
        assert!(guard.check().is_ok());
    }

    #[tokio::test]
    async fn with_budget_releases_on_success_and_failure() {
        let ledger = Arc::new(UsageLedger::new());

        let out = with_budget(Arc::clone(&ledger), BudgetLimits::cost(0.10), || {
            let ledger = Arc::clone(&ledger);
            async move {
                track(&ledger, 10, 0.04)?;
                Ok::<_, TallyError>(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 42);

        let err = with_budget(Arc::clone(&ledger), BudgetLimits::cost(0.01), || {
            let ledger = Arc::clone(&ledger);
            async move {
                track(&ledger, 10, 0.05)?;
                Ok::<_, TallyError>(0)
            }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TallyError::BudgetExceeded { .. }));

        // Both scopes released their guards.
        assert!(track(&ledger, 10, 99.0).is_ok());
    }
}
