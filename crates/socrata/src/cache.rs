//! Size- and time-bounded LRU cache for document retrieval results.

use crate::error::Result;
use crate::rows::{serialized_len, Row};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide handle to the response cache.
pub type SharedCache = Arc<Mutex<ResponseCache>>;

#[derive(Debug)]
struct CacheEntry {
    value: Arc<Vec<Row>>,
    stored_at: Instant,
    size_bytes: usize,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub used_bytes: usize,
    pub capacity_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// LRU cache bounded by total serialized size and entry age.
///
/// Entries live in an `IndexMap` whose order is the access order: the front
/// is least recently used, the back most recently used. The sum of entry
/// sizes never exceeds `capacity_bytes`.
#[derive(Debug)]
pub struct ResponseCache {
    entries: IndexMap<String, CacheEntry>,
    capacity_bytes: usize,
    ttl: Duration,
    used_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl ResponseCache {
    pub fn new(capacity_bytes: usize, ttl: Duration) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity_bytes,
            ttl,
            used_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Builds a cache sized from `OPENGOV_CACHE_MAX_BYTES` and `OPENGOV_CACHE_TTL_MS`.
    pub fn from_env() -> Self {
        Self::new(opengov_state::cache_max_bytes(), opengov_state::cache_ttl())
    }

    pub fn shared(self) -> SharedCache {
        Arc::new(Mutex::new(self))
    }

    /// Returns the cached value and marks it most recently used.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<Arc<Vec<Row>>> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<Arc<Vec<Row>>> {
        let Some(index) = self.entries.get_index_of(key) else {
            self.misses += 1;
            return None;
        };

        let expired = self
            .entries
            .get_index(index)
            .is_some_and(|(_, entry)| self.is_expired(entry, now));
        if expired {
            self.remove_index(index);
            self.expirations += 1;
            self.misses += 1;
            tracing::debug!(target: "opengov::cache", key, "expired on read");
            return None;
        }

        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.hits += 1;
        self.entries
            .get_index(last)
            .map(|(_, entry)| Arc::clone(&entry.value))
    }

    /// Stores `value` under `key`, evicting least recently used entries
    /// until it fits.
    ///
    /// Returns `Ok(false)` without touching the cache when the value alone
    /// is larger than the whole capacity.
    pub fn set(&mut self, key: impl Into<String>, value: Vec<Row>) -> Result<bool> {
        self.set_at(key.into(), value, Instant::now())
    }

    fn set_at(&mut self, key: String, value: Vec<Row>, now: Instant) -> Result<bool> {
        let size_bytes = serialized_len(&value)?;
        if size_bytes > self.capacity_bytes {
            tracing::debug!(
                target: "opengov::cache",
                key = %key,
                size_bytes,
                capacity = self.capacity_bytes,
                "value larger than cache, not stored"
            );
            return Ok(false);
        }

        if let Some(index) = self.entries.get_index_of(&key) {
            self.remove_index(index);
        }
        while self.used_bytes + size_bytes > self.capacity_bytes {
            if self.entries.is_empty() {
                break;
            }
            if let Some((evicted, _)) = self.remove_index(0) {
                self.evictions += 1;
                tracing::debug!(target: "opengov::cache", key = %evicted, "evicted least recently used");
            }
        }

        self.used_bytes += size_bytes;
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                stored_at: now,
                size_bytes,
            },
        );
        Ok(true)
    }

    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.get_index_of(key) {
            Some(index) => self.remove_index(index).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.used_bytes = 0;
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(Instant::now())
    }

    fn cleanup_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        let mut reclaimed = 0;
        self.entries.retain(|_, entry| {
            let keep = now.saturating_duration_since(entry.stored_at) <= ttl;
            if !keep {
                reclaimed += entry.size_bytes;
            }
            keep
        });
        self.used_bytes -= reclaimed;
        let removed = before - self.entries.len();
        self.expirations += removed as u64;
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            used_bytes: self.used_bytes,
            capacity_bytes: self.capacity_bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) > self.ttl
    }

    fn remove_index(&mut self, index: usize) -> Option<(String, CacheEntry)> {
        let removed = self.entries.shift_remove_index(index)?;
        self.used_bytes -= removed.1.size_bytes;
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    const TTL: Duration = Duration::from_secs(300);

    fn rows(payload_len: usize) -> Vec<Row> {
        match json!({ "text": "x".repeat(payload_len) }) {
            Value::Object(row) => vec![row],
            _ => unreachable!(),
        }
    }

    fn size_of(payload_len: usize) -> usize {
        serialized_len(&rows(payload_len)).unwrap()
    }

    fn keys(cache: &ResponseCache) -> Vec<&str> {
        cache.entries.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_get_returns_stored_value() {
        let mut cache = ResponseCache::new(10_000, TTL);
        assert!(cache.set("k", rows(10)).unwrap());
        let hit = cache.get("k").unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert!(cache.get("missing").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_oversized_value_is_not_stored() {
        let mut cache = ResponseCache::new(size_of(100) - 1, TTL);
        assert!(!cache.set("big", rows(100)).unwrap());
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted_first() {
        let mut cache = ResponseCache::new(size_of(50) * 3, TTL);
        cache.set("a", rows(50)).unwrap();
        cache.set("b", rows(50)).unwrap();
        cache.set("c", rows(50)).unwrap();
        cache.get("a");

        cache.set("d", rows(50)).unwrap();
        assert_eq!(keys(&cache), ["c", "a", "d"]);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.used_bytes(), size_of(50) * 3);
    }

    #[test]
    fn test_replacing_a_key_reuses_its_space() {
        let mut cache = ResponseCache::new(size_of(50) * 2, TTL);
        cache.set("a", rows(50)).unwrap();
        cache.set("b", rows(50)).unwrap();
        cache.set("a", rows(50)).unwrap();
        assert_eq!(keys(&cache), ["b", "a"]);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let mut cache = ResponseCache::new(10_000, Duration::from_secs(60));
        let start = Instant::now();
        cache.set_at("k".into(), rows(10), start).unwrap();

        assert!(cache.get_at("k", start + Duration::from_secs(60)).is_some());
        assert!(cache.get_at("k", start + Duration::from_secs(61)).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_cleanup_removes_only_expired_entries() {
        let mut cache = ResponseCache::new(10_000, Duration::from_secs(60));
        let start = Instant::now();
        cache.set_at("old".into(), rows(10), start).unwrap();
        cache
            .set_at("new".into(), rows(10), start + Duration::from_secs(30))
            .unwrap();

        let removed = cache.cleanup_at(start + Duration::from_secs(75));
        assert_eq!(removed, 1);
        assert_eq!(keys(&cache), ["new"]);
        assert_eq!(cache.used_bytes(), size_of(10));
    }

    #[test]
    fn test_delete_and_clear_release_space() {
        let mut cache = ResponseCache::new(10_000, TTL);
        cache.set("a", rows(10)).unwrap();
        cache.set("b", rows(10)).unwrap();
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.used_bytes(), size_of(10));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, usize),
        Get(u8),
        Delete(u8),
        Cleanup,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8, 0usize..400).prop_map(|(k, n)| Op::Set(k, n)),
            (0u8..8).prop_map(Op::Get),
            (0u8..8).prop_map(Op::Delete),
            Just(Op::Cleanup),
        ]
    }

    proptest! {
        #[test]
        fn prop_size_accounting_stays_within_capacity(ops in proptest::collection::vec(op(), 1..80)) {
            let mut cache = ResponseCache::new(1_000, TTL);
            for op in ops {
                match op {
                    Op::Set(k, n) => { cache.set(format!("k{k}"), rows(n)).unwrap(); }
                    Op::Get(k) => { cache.get(&format!("k{k}")); }
                    Op::Delete(k) => { cache.delete(&format!("k{k}")); }
                    Op::Cleanup => { cache.cleanup(); }
                }
                let sum: usize = cache.entries.values().map(|e| e.size_bytes).sum();
                prop_assert_eq!(sum, cache.used_bytes());
                prop_assert!(cache.used_bytes() <= cache.capacity_bytes());
            }
        }

        #[test]
        fn prop_last_touched_key_is_most_recent(n in 2u8..8) {
            let mut cache = ResponseCache::new(100_000, TTL);
            for k in 0..n {
                cache.set(format!("k{k}"), rows(5)).unwrap();
            }
            cache.get("k0");
            prop_assert_eq!(keys(&cache).last().copied(), Some("k0"));
            prop_assert_eq!(cache.len(), n as usize);
        }
    }
}
