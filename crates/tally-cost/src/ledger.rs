// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory usage ledger.
//!
//! The ledger owns an append-only sequence of [`UsageRecord`]s plus derived
//! aggregates (overall and per-provider), kept consistent in a single
//! critical section. Aggregates always equal a fold over the record
//! sequence; no record is dropped or double-counted, and records are never
//! mutated after append.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{TallyError, UsageTotals};
use tracing::info;

use crate::budget::BudgetState;

/// One tracked provider call. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    /// Provider the call was attributed to.
    pub provider: String,
    /// Model identifier used.
    pub model: String,
    /// Number of prompt/input tokens.
    pub prompt_tokens: u64,
    /// Number of completion/output tokens.
    pub completion_tokens: u64,
    /// Cost of the call in USD.
    pub cost_usd: f64,
    /// When the call was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Consistent point-in-time copy of the ledger aggregates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerSnapshot {
    /// Overall totals across all providers.
    pub totals: UsageTotals,
    /// Totals broken down by provider.
    pub by_provider: HashMap<String, UsageTotals>,
}

#[derive(Default)]
struct LedgerInner {
    records: Vec<UsageRecord>,
    totals: UsageTotals,
    by_provider: HashMap<String, UsageTotals>,
}

/// Thread-safe accumulator of per-call usage records.
///
/// One ledger is constructed per tracking session and threaded explicitly
/// (via `Arc`) into every proxy and budget guard that must observe it.
pub struct UsageLedger {
    inner: Mutex<LedgerInner>,
    guards: Mutex<Vec<Arc<BudgetState>>>,
}

impl UsageLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner::default()),
            guards: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one usage record and update all aggregates atomically.
    ///
    /// Returns a clone of the stored record (callers may need its id and
    /// timestamp). The record itself is never mutated afterwards.
    pub fn record(
        &self,
        provider: &str,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_usd: f64,
    ) -> UsageRecord {
        let record = UsageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
            cost_usd,
            timestamp: Utc::now(),
        };

        {
            let mut inner = self.lock();
            inner
                .totals
                .add_call(prompt_tokens, completion_tokens, cost_usd);
            inner
                .by_provider
                .entry(provider.to_string())
                .or_default()
                .add_call(prompt_tokens, completion_tokens, cost_usd);
            inner.records.push(record.clone());
        }

        info!(
            provider,
            model,
            prompt_tokens,
            completion_tokens,
            cost_usd,
            "usage recorded"
        );
        record
    }

    /// Overall totals, copied out under the lock.
    pub fn totals(&self) -> UsageTotals {
        self.lock().totals
    }

    /// Consistent copy of overall and per-provider aggregates.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.lock();
        LedgerSnapshot {
            totals: inner.totals,
            by_provider: inner.by_provider.clone(),
        }
    }

    /// Copy of the full record sequence, in append order.
    pub fn records(&self) -> Vec<UsageRecord> {
        self.lock().records.clone()
    }

    /// Atomically clear records and aggregates.
    ///
    /// A concurrent `record` lands either fully before or fully after the
    /// reset, never interleaved. Active budget guards are left registered;
    /// their deltas clamp at zero.
    pub fn reset(&self) {
        let mut inner = self.lock();
        *inner = LedgerInner::default();
    }

    /// Register an active budget guard. Called from `BudgetGuard::new`.
    pub(crate) fn register_guard(&self, state: Arc<BudgetState>) {
        self.guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(state);
    }

    /// Deregister a guard by id. Called from `BudgetGuard::drop`.
    pub(crate) fn deregister_guard(&self, id: u64) {
        self.guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|g| g.id != id);
    }

    /// Evaluate every active budget guard against the current totals.
    ///
    /// Called after each record. Guards are checked in registration order
    /// (outermost scope first); the first breach aborts with its error.
    /// The triggering record stays in the ledger.
    pub fn enforce_budgets(&self) -> Result<(), TallyError> {
        let guards: Vec<Arc<BudgetState>> = self
            .guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if guards.is_empty() {
            return Ok(());
        }
        let totals = self.totals();
        for guard in guards {
            guard.check(&totals)?;
        }
        Ok(())
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::new()
    }
}
