use httpdns_domain::{ip_list_from, QueryType, ResolveResult};
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::net::lookup_host;
use tracing::debug;

/// Resolves through the platform resolver when HTTPDNS gives no answer.
///
/// Answers carry a fixed TTL and are never written to the HTTPDNS cache.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    ttl: u32,
    timeout: Duration,
}

impl LocalResolver {
    pub fn new(ttl: u32, timeout: Duration) -> Self {
        Self { ttl, timeout }
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub async fn resolve(&self, host: &str, query_type: QueryType) -> Option<ResolveResult> {
        let addrs = match tokio::time::timeout(self.timeout, lookup_host((host, 0))).await {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(e)) => {
                debug!(host = %host, error = %e, "System resolver lookup failed");
                return None;
            }
            Err(_) => {
                debug!(host = %host, "System resolver lookup timed out");
                return None;
            }
        };

        let (mut ipv4, mut ipv6) = (Vec::new(), Vec::new());
        for addr in addrs {
            match addr.ip() {
                IpAddr::V4(ip) if query_type.wants_ipv4() => ipv4.push(ip.to_string()),
                IpAddr::V6(ip) if query_type.wants_ipv6() => ipv6.push(ip.to_string()),
                _ => {}
            }
        }

        let mut result = ResolveResult::new(host, host)
            .with_ttl(self.ttl)
            .with_timestamp(Instant::now());
        result.ips = ip_list_from(ipv4.iter().map(String::as_str));
        result.ipsv6 = ip_list_from(ipv6.iter().map(String::as_str));
        if result.is_empty() {
            return None;
        }
        debug!(
            host = %host,
            ipv4 = result.ips.len(),
            ipv6 = result.ipsv6.len(),
            "Resolved through system resolver"
        );
        Some(result)
    }
}
