// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request fingerprinting and response caching for Tally.
//!
//! [`ResponseCache`] pairs a pluggable [`CacheBackend`] (in-memory or
//! on-disk) with hit/miss/saved-cost statistics. A hit through the
//! tracking proxy returns the stored response without touching the wrapped
//! provider client — identical calls are free.

pub mod backend;
pub mod disk;
pub mod fingerprint;
pub mod memory;

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tally_core::TallyError;
use tracing::debug;

pub use backend::{CacheBackend, CacheEntry};
pub use disk::DiskCache;
pub use fingerprint::fingerprint;
pub use memory::MemoryCache;

/// Running cache statistics.
///
/// `saved_cost_usd` and `saved_tokens` sum the write-time cost and token
/// count of every entry served as a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub saved_cost_usd: f64,
    pub saved_tokens: u64,
}

/// Content-addressed response store with hit accounting.
pub struct ResponseCache {
    backend: Box<dyn CacheBackend>,
    stats: Mutex<CacheStats>,
}

impl ResponseCache {
    /// Cache backed by an unbounded in-memory store.
    pub fn memory() -> Self {
        Self::with_backend(Box::new(MemoryCache::new()))
    }

    /// Cache backed by an LRU-bounded in-memory store.
    pub fn memory_with_capacity(capacity: usize) -> Self {
        Self::with_backend(Box::new(MemoryCache::with_capacity(capacity)))
    }

    /// Cache backed by a directory of `<digest>.json` files.
    pub fn disk(dir: impl Into<std::path::PathBuf>) -> Result<Self, TallyError> {
        Ok(Self::with_backend(Box::new(DiskCache::new(dir)?)))
    }

    /// Cache over a caller-supplied backend.
    pub fn with_backend(backend: Box<dyn CacheBackend>) -> Self {
        Self {
            backend,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Probe the cache, recording a hit or miss.
    ///
    /// On a hit the entry's write-time cost and token count are added to
    /// the saved totals.
    pub fn get(&self, digest: &str) -> Result<Option<CacheEntry>, TallyError> {
        let found = self.backend.get(digest)?;
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        match &found {
            Some(entry) => {
                stats.hits += 1;
                stats.saved_cost_usd += entry.cost_usd;
                stats.saved_tokens += entry.saved_tokens;
                debug!(digest, "cache hit");
            }
            None => {
                stats.misses += 1;
                debug!(digest, "cache miss");
            }
        }
        Ok(found)
    }

    /// Store a response under a digest, stamping the entry with the cost
    /// and token count of the call that produced it.
    pub fn put(
        &self,
        digest: &str,
        response: Value,
        cost_usd: f64,
        saved_tokens: u64,
    ) -> Result<(), TallyError> {
        self.backend.put(
            digest,
            CacheEntry {
                response,
                cost_usd,
                saved_tokens,
                created_at: Utc::now(),
            },
        )
    }

    /// Point-in-time copy of the statistics.
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every stored entry. Statistics are kept.
    pub fn clear(&self) -> Result<(), TallyError> {
        self.backend.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stats_track_hits_misses_and_savings() {
        let cache = ResponseCache::memory();
        let digest = fingerprint(&json!({"model": "m", "prompt": "hi"}));

        assert!(cache.get(&digest).unwrap().is_none());
        cache
            .put(&digest, json!({"content": "hello"}), 0.02, 150)
            .unwrap();
        assert!(cache.get(&digest).unwrap().is_some());
        assert!(cache.get(&digest).unwrap().is_some());

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert!((stats.saved_cost_usd - 0.04).abs() < 1e-12);
        assert_eq!(stats.saved_tokens, 300);
    }

    #[test]
    fn saved_cost_reflects_write_time_price() {
        let cache = ResponseCache::memory();
        cache.put("d", json!({}), 0.10, 10).unwrap();
        // Overwrite with a cheaper cost; hits report the stored value.
        cache.put("d", json!({}), 0.01, 10).unwrap();
        cache.get("d").unwrap();
        assert!((cache.stats().saved_cost_usd - 0.01).abs() < 1e-12);
    }

    #[test]
    fn clear_keeps_statistics() {
        let cache = ResponseCache::memory();
        cache.put("d", json!({}), 0.01, 10).unwrap();
        cache.get("d").unwrap();
        cache.clear().unwrap();

        assert!(cache.get("d").unwrap().is_none());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn disk_constructor_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::disk(dir.path()).unwrap();
        cache.put("d", json!({"ok": true}), 0.0, 0).unwrap();
        assert!(cache.get("d").unwrap().is_some());
    }
}
