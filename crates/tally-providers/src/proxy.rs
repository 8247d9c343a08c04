// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tracking client proxy.
//!
//! `TrackedClient` wraps a caller-supplied [`ProviderClient`] so that every
//! call is observed: cache probe, delegation to the real client, usage
//! extraction, pricing, ledger append, optional cache store, budget check.
//! Under any successful path the response value reaches the caller
//! unchanged; the proxy is strictly observational plus optional caching.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use tally_cache::{ResponseCache, fingerprint};
use tally_core::{ProviderClient, TallyError, UsageExtractor};
use tally_cost::Tracker;

/// A provider client wrapped with usage tracking.
pub struct TrackedClient<C> {
    inner: C,
    extractor: Box<dyn UsageExtractor>,
    tracker: Tracker,
    cache: Option<Arc<ResponseCache>>,
}

impl<C: ProviderClient> TrackedClient<C> {
    /// Wrap `inner`, attributing usage through `extractor` into the
    /// tracker's ledger.
    pub fn new(inner: C, extractor: impl UsageExtractor + 'static, tracker: Tracker) -> Self {
        Self {
            inner,
            extractor: Box::new(extractor),
            tracker,
            cache: None,
        }
    }

    /// Attach a response cache. Hits short-circuit the wrapped client.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The tracker this proxy records into.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Perform one tracked provider call.
    ///
    /// On a cache hit the stored response is returned without invoking the
    /// wrapped client or the ledger: a hit represents no provider cost, so
    /// it is free and untracked. On a miss the real call is made with no
    /// lock held, priced, recorded, cached, and budget-checked. A budget
    /// breach surfaces as the call's error with the triggering record
    /// already in the ledger.
    pub async fn call(&self, request: Value) -> Result<Value, TallyError> {
        let digest = self.cache.as_ref().map(|_| fingerprint(&request));

        if let (Some(cache), Some(digest)) = (&self.cache, &digest) {
            match cache.get(digest) {
                Ok(Some(entry)) => {
                    debug!(digest, "returning cached response");
                    return Ok(entry.response);
                }
                Ok(None) => {}
                // A broken cache must not break the call; fall through to
                // the real client.
                Err(e) => warn!(digest, error = %e, "cache probe failed"),
            }
        }

        let response = self.inner.call(&request).await?;

        let usage = self.extractor.extract(&response)?;
        let cost_usd = self.tracker.pricing().cost(
            &usage.model,
            usage.prompt_tokens,
            usage.completion_tokens,
        )?;
        let record = self.tracker.ledger().record(
            self.extractor.provider(),
            &usage.model,
            usage.prompt_tokens,
            usage.completion_tokens,
            cost_usd,
        );

        if let (Some(cache), Some(digest)) = (&self.cache, &digest)
            && let Err(e) = cache.put(digest, response.clone(), record.cost_usd, usage.total_tokens())
        {
            warn!(digest, error = %e, "failed to cache response");
        }

        self.tracker.ledger().enforce_budgets()?;
        Ok(response)
    }
}

// A tracked client is itself a provider client, so proxies compose.
#[async_trait]
impl<C: ProviderClient> ProviderClient for TrackedClient<C> {
    async fn call(&self, request: &Value) -> Result<Value, TallyError> {
        TrackedClient::call(self, request.clone()).await
    }
}
