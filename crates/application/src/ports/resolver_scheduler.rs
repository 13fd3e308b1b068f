use async_trait::async_trait;
use httpdns_domain::IpEntry;

/// Hands out resolver servers and learns their latency.
#[async_trait]
pub trait ResolverScheduler: Send + Sync {
    async fn get(&self) -> Option<IpEntry>;

    /// Best server other than `exclude`; falls back to `get` when `exclude`
    /// is the only one known.
    async fn get_excluding(&self, exclude: &str) -> Option<IpEntry>;

    fn update(&self, addr: &str, sample_ms: u32);
}
