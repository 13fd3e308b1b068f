// Answer cache: storage + metrics

pub mod metrics;
pub mod storage;

pub use metrics::CacheMetrics;
pub use storage::ResultCache;
