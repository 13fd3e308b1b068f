use async_trait::async_trait;
use httpdns_application::ports::StackDetector;
use httpdns_domain::{ClientConfig, NetStackType};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info};

const DEFAULT_PROBE_DOMAIN: &str = "www.taobao.com";
const PROBE_PORT: u16 = 80;
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

const IPV4_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);
const IPV6_PROBE_TARGET: SocketAddr = SocketAddr::new(
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
    53,
);

/// Detects which IP families the host can route.
///
/// A UDP `connect` to a public resolver address per family asks the kernel
/// for a route without sending a datagram. When neither probe succeeds the
/// families returned by the system resolver for the probe domain decide.
pub struct NetStackDetector {
    probe_domain: Mutex<String>,
    ipv4_target: SocketAddr,
    ipv6_target: SocketAddr,
    use_cache: AtomicBool,
    cached: AtomicU8,
}

impl NetStackDetector {
    pub fn new(probe_domain: impl Into<String>, use_cache: bool) -> Self {
        Self {
            probe_domain: Mutex::new(probe_domain.into()),
            ipv4_target: IPV4_PROBE_TARGET,
            ipv6_target: IPV6_PROBE_TARGET,
            use_cache: AtomicBool::new(use_cache),
            cached: AtomicU8::new(NetStackType::Unknown as u8),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.probe_domain.clone(), config.net_stack_cache)
    }

    /// Probe other addresses than the public resolvers.
    pub fn with_probe_targets(mut self, ipv4: SocketAddr, ipv6: SocketAddr) -> Self {
        self.ipv4_target = ipv4;
        self.ipv6_target = ipv6;
        self
    }

    pub fn set_probe_domain(&self, domain: impl Into<String>) {
        *self
            .probe_domain
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = domain.into();
    }

    pub fn set_using_cache(&self, use_cache: bool) {
        self.use_cache.store(use_cache, Ordering::Relaxed);
    }

    /// Last conclusive detection, or `Unknown`.
    pub fn cached(&self) -> NetStackType {
        NetStackType::from_u8(self.cached.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        self.cached
            .store(NetStackType::Unknown as u8, Ordering::Relaxed);
    }

    pub async fn detect(&self) -> NetStackType {
        if self.use_cache.load(Ordering::Relaxed) {
            let cached = self.cached();
            if cached != NetStackType::Unknown {
                return cached;
            }
        }

        let ipv4 = udp_route_probe(self.ipv4_target).await;
        let ipv6 = udp_route_probe(self.ipv6_target).await;
        let mut detected = NetStackType::from_bits(ipv4, ipv6);

        if detected == NetStackType::Unknown {
            let domain = self
                .probe_domain
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            detected = resolver_probe(&domain).await;
        }

        if detected != NetStackType::Unknown {
            let previous = self.cached.swap(detected as u8, Ordering::Relaxed);
            if previous != detected as u8 {
                info!(stack = %detected, "Network stack detected");
            }
        }
        detected
    }
}

impl Default for NetStackDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_DOMAIN, true)
    }
}

#[async_trait]
impl StackDetector for NetStackDetector {
    async fn stack_type(&self) -> NetStackType {
        self.detect().await
    }
}

async fn udp_route_probe(target: SocketAddr) -> bool {
    let bind: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = match UdpSocket::bind(bind).await {
        Ok(socket) => socket,
        Err(e) => {
            debug!(bind = %bind, error = %e, "Probe socket bind failed");
            return false;
        }
    };
    match socket.connect(target).await {
        Ok(()) => true,
        Err(e) => {
            debug!(target = %target, error = %e, "No route for probe target");
            false
        }
    }
}

async fn resolver_probe(domain: &str) -> NetStackType {
    let lookup = tokio::time::timeout(LOOKUP_TIMEOUT, lookup_host((domain, PROBE_PORT))).await;
    match lookup {
        Ok(Ok(addrs)) => {
            let (mut ipv4, mut ipv6) = (false, false);
            for addr in addrs {
                ipv4 |= addr.is_ipv4();
                ipv6 |= addr.is_ipv6();
            }
            NetStackType::from_bits(ipv4, ipv6)
        }
        Ok(Err(e)) => {
            debug!(domain = %domain, error = %e, "Probe domain lookup failed");
            NetStackType::Unknown
        }
        Err(_) => {
            debug!(domain = %domain, "Probe domain lookup timed out");
            NetStackType::Unknown
        }
    }
}
