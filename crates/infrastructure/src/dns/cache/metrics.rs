use std::sync::atomic::{AtomicU64, Ordering};

/// Cache counters
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Lookups that found an entry lacking the requested family.
    pub partial_hits: AtomicU64,
    pub lazy_deletions: AtomicU64,
    pub insertions: AtomicU64,
    pub merges: AtomicU64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.partial_hits,
            &self.lazy_deletions,
            &self.insertions,
            &self.merges,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
