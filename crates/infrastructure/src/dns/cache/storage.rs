use super::CacheMetrics;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use httpdns_application::ports::AnswerCache;
use httpdns_domain::{DomainError, QueryType, ResolveResult};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Resolve-result cache keyed by cache key (the host unless the request
/// carries its own key).
///
/// Expired entries are evicted lazily on lookup. Every value handed out is a
/// clone; callers never hold a reference into the map.
pub struct ResultCache {
    entries: DashMap<String, ResolveResult, FxBuildHasher>,
    metrics: Arc<CacheMetrics>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher::default()),
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str, query_type: QueryType) -> Option<ResolveResult> {
        self.get_at(key, query_type, Instant::now())
    }

    /// Lookup as of `now`.
    ///
    /// `A` needs IPv4 addresses and `AAAA` needs IPv6 addresses. `Both` and
    /// `Auto` accept an entry holding either family so the caller can issue
    /// a narrowed query for the missing one.
    pub fn get_at(&self, key: &str, query_type: QueryType, now: Instant) -> Option<ResolveResult> {
        let Some(entry) = self.entries.get(key) else {
            self.metrics.misses.fetch_add(1, AtomicOrdering::Relaxed);
            return None;
        };

        if entry.is_expired_at(now) {
            drop(entry);
            self.lazy_remove(key, now);
            self.metrics.misses.fetch_add(1, AtomicOrdering::Relaxed);
            return None;
        }

        let usable = match query_type {
            QueryType::A => !entry.ips.is_empty(),
            QueryType::AAAA => !entry.ipsv6.is_empty(),
            QueryType::Both | QueryType::Auto => !entry.is_empty(),
        };
        if !usable {
            self.metrics.misses.fetch_add(1, AtomicOrdering::Relaxed);
            return None;
        }

        if entry.satisfies(query_type) {
            self.metrics.hits.fetch_add(1, AtomicOrdering::Relaxed);
        } else {
            self.metrics.partial_hits.fetch_add(1, AtomicOrdering::Relaxed);
        }
        Some(entry.value().clone())
    }

    /// Insert a new entry. Fails when the key is empty or already present.
    pub fn add(&self, entry: &ResolveResult) -> Result<(), DomainError> {
        if entry.cache_key.is_empty() {
            return Err(DomainError::InvalidCacheKey(format!(
                "empty key for host '{}'",
                entry.host
            )));
        }
        match self.entries.entry(entry.cache_key.clone()) {
            Entry::Occupied(_) => Err(DomainError::CacheEntryExists(entry.cache_key.clone())),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                self.metrics.insertions.fetch_add(1, AtomicOrdering::Relaxed);
                Ok(())
            }
        }
    }

    /// Insert, or merge into the live entry.
    ///
    /// A merge only fills address families the stored entry lacks; TTLs and
    /// the query timestamp always take the incoming values. An expired stored
    /// entry is replaced outright.
    pub fn update(&self, entry: &ResolveResult) {
        if entry.cache_key.is_empty() {
            debug!(host = %entry.host, "Refusing to cache answer without a key");
            return;
        }
        match self.entries.entry(entry.cache_key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                self.metrics.insertions.fetch_add(1, AtomicOrdering::Relaxed);
            }
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                if stored.is_expired_at(entry.query_timestamp) {
                    *stored = entry.clone();
                    self.metrics.insertions.fetch_add(1, AtomicOrdering::Relaxed);
                    return;
                }
                stored.fill_gaps_from(entry);
                stored.ttl = entry.ttl;
                stored.origin_ttl = entry.origin_ttl;
                stored.query_timestamp = entry.query_timestamp;
                if entry.client_ip.is_some() {
                    stored.client_ip = entry.client_ip.clone();
                }
                self.metrics.merges.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Move the first address of each family of the stored entry to the back.
    pub fn rotate(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.rotate();
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.metrics.reset();
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Remove only if still expired; a concurrent update may have refreshed it.
    fn lazy_remove(&self, key: &str, now: Instant) {
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired_at(now))
            .is_some()
        {
            self.metrics
                .lazy_deletions
                .fetch_add(1, AtomicOrdering::Relaxed);
            debug!(key = %key, "Evicted expired entry");
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerCache for ResultCache {
    fn lookup(&self, key: &str, query_type: QueryType) -> Option<ResolveResult> {
        self.get(key, query_type)
    }

    fn rotate(&self, key: &str) {
        ResultCache::rotate(self, key);
    }

    fn store(&self, entry: &ResolveResult) {
        self.update(entry);
    }
}
