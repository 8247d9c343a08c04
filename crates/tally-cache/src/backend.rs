// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache backend trait and the stored entry shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::TallyError;

/// One cached response, keyed externally by its request fingerprint.
///
/// Created on first observation of a fingerprint and read-only until
/// evicted or cleared. `cost_usd` is captured at write time; a later hit
/// reports that original cost as saved, not the current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The raw provider response.
    pub response: Value,
    /// Cost of the call that produced this response, in USD.
    pub cost_usd: f64,
    /// Tokens the call consumed (prompt + completion).
    pub saved_tokens: u64,
    /// When the entry was stored.
    pub created_at: DateTime<Utc>,
}

/// Storage behind a [`crate::ResponseCache`].
///
/// `put` is idempotent: a second write for the same digest overwrites, and
/// a concurrent reader sees a complete entry or none, never a torn one.
pub trait CacheBackend: Send + Sync {
    /// Fetch the entry for a digest, if present.
    fn get(&self, digest: &str) -> Result<Option<CacheEntry>, TallyError>;

    /// Store (or overwrite) the entry for a digest.
    fn put(&self, digest: &str, entry: CacheEntry) -> Result<(), TallyError>;

    /// Drop every stored entry.
    fn clear(&self) -> Result<(), TallyError>;
}
