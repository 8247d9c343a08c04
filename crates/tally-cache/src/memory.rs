// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory cache backend, unbounded or LRU-bounded.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tally_core::TallyError;

use crate::backend::{CacheBackend, CacheEntry};

struct Slot {
    entry: CacheEntry,
    last_used: u64,
}

#[derive(Default)]
struct MemoryInner {
    slots: HashMap<String, Slot>,
    // Monotonic access counter for LRU ordering.
    tick: u64,
}

/// Process-lifetime cache backend.
///
/// With a capacity, inserting past the bound evicts the least-recently-used
/// entry. Without one, the cache grows until cleared.
pub struct MemoryCache {
    inner: Mutex<MemoryInner>,
    capacity: Option<usize>,
}

impl MemoryCache {
    /// Unbounded in-memory cache.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            capacity: None,
        }
    }

    /// LRU-bounded in-memory cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            capacity: Some(capacity.max(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, digest: &str) -> Result<Option<CacheEntry>, TallyError> {
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        Ok(inner.slots.get_mut(digest).map(|slot| {
            slot.last_used = tick;
            slot.entry.clone()
        }))
    }

    fn put(&self, digest: &str, entry: CacheEntry) -> Result<(), TallyError> {
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        inner
            .slots
            .insert(digest.to_string(), Slot { entry, last_used: tick });

        if let Some(capacity) = self.capacity
            && inner.slots.len() > capacity
        {
            let oldest = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                inner.slots.remove(&key);
            }
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), TallyError> {
        self.lock().slots.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(marker: &str) -> CacheEntry {
        CacheEntry {
            response: json!({"content": marker}),
            cost_usd: 0.01,
            saved_tokens: 30,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn get_put_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.get("d1").unwrap().is_none());

        cache.put("d1", entry("one")).unwrap();
        let got = cache.get("d1").unwrap().unwrap();
        assert_eq!(got.response["content"], "one");
    }

    #[test]
    fn put_overwrites_idempotently() {
        let cache = MemoryCache::new();
        cache.put("d1", entry("one")).unwrap();
        cache.put("d1", entry("two")).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("d1").unwrap().unwrap().response["content"], "two");
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = MemoryCache::with_capacity(2);
        cache.put("a", entry("a")).unwrap();
        cache.put("b", entry("b")).unwrap();
        // Touch "a" so "b" becomes the LRU entry.
        cache.get("a").unwrap();
        cache.put("c", entry("c")).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").unwrap().is_some());
        assert!(cache.get("b").unwrap().is_none());
        assert!(cache.get("c").unwrap().is_some());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = MemoryCache::new();
        cache.put("a", entry("a")).unwrap();
        cache.put("b", entry("b")).unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert!(cache.get("a").unwrap().is_none());
    }
}
