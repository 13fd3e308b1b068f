use super::boot::BootServers;
use super::ewma::ewma;
use async_trait::async_trait;
use chrono::Utc;
use httpdns_application::ports::{
    HttpExchanger, HttpRequest, RequestSigner, ResolverScheduler, ResponseParser, StackDetector,
};
use httpdns_application::use_cases::QueryUrlBuilder;
use httpdns_domain::{ClientConfig, DomainError, IpEntry, IpList, NetStackType};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

const NONCE_LEN: usize = 12;

#[derive(Debug, Default)]
struct ServerLists {
    ipv4: Vec<IpEntry>,
    ipv6: Vec<IpEntry>,
}

impl ServerLists {
    fn for_stack(&self, stack: NetStackType) -> &Vec<IpEntry> {
        if stack == NetStackType::Ipv6Only {
            &self.ipv6
        } else {
            &self.ipv4
        }
    }
}

/// Resolver-server scheduler.
///
/// Learns the server set from a boot server, hands out the lowest-RTT server
/// for the current IP stack and folds every exchange latency back in. The
/// list lock is never held across an await.
pub struct ServerScheduler {
    servers: RwLock<ServerLists>,
    config: ClientConfig,
    detector: Arc<dyn StackDetector>,
    exchanger: Arc<dyn HttpExchanger>,
    parser: Arc<dyn ResponseParser>,
    signer: Arc<dyn RequestSigner>,
}

impl ServerScheduler {
    pub fn new(
        config: ClientConfig,
        detector: Arc<dyn StackDetector>,
        exchanger: Arc<dyn HttpExchanger>,
        parser: Arc<dyn ResponseParser>,
        signer: Arc<dyn RequestSigner>,
    ) -> Self {
        Self {
            servers: RwLock::new(ServerLists::default()),
            config,
            detector,
            exchanger,
            parser,
            signer,
        }
    }

    /// Fetch the resolver-server list from a boot server.
    ///
    /// Starts at a random boot server and walks the list once. The first
    /// schedule answer with at least one server is merged into the scheduler
    /// and into `boot`.
    pub async fn bootstrap(&self, boot: &mut BootServers) -> Result<(), DomainError> {
        let stack = self.detector.stack_type().await;
        let candidates = boot.candidates(stack).to_vec();
        if candidates.is_empty() {
            warn!(stack = %stack, "No boot servers configured for this IP stack");
            return Err(DomainError::BootstrapFailed(0));
        }

        let builder = QueryUrlBuilder::new(
            self.signer.as_ref(),
            &self.config.platform,
            &self.config.sdk_version,
            Duration::from_secs(self.config.sign_offset_secs),
        );
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let start = fastrand::usize(..candidates.len());

        for step in 0..candidates.len() {
            let server = &candidates[(start + step) % candidates.len()];
            let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
            let nonce: String = std::iter::repeat_with(fastrand::alphanumeric)
                .take(NONCE_LEN)
                .collect();
            let url = builder.schedule_url(&self.config, server, now, &nonce);

            let response = match self
                .exchanger
                .exchange(&HttpRequest::new(url, server.as_str(), timeout))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(boot_server = %server, error = %e, "Schedule request failed");
                    continue;
                }
            };
            if !response.is_ok() {
                warn!(
                    boot_server = %server,
                    status = response.status_code,
                    "Boot server returned error status"
                );
                continue;
            }

            let answer = self.parser.parse_schedule(&response.body);
            if answer.is_empty() {
                warn!(boot_server = %server, "Schedule answer listed no servers");
                continue;
            }

            let added = self.add_servers(&answer.ipv4, &answer.ipv6);
            boot.merge(&answer);
            info!(
                boot_server = %server,
                ipv4 = answer.ipv4.len(),
                ipv6 = answer.ipv6.len(),
                new_servers = added,
                "Resolver servers scheduled"
            );
            return Ok(());
        }

        warn!(tried = candidates.len(), "Every boot server failed");
        Err(DomainError::BootstrapFailed(candidates.len()))
    }

    /// Lowest-RTT server for the current IP stack.
    pub async fn get(&self) -> Option<IpEntry> {
        let stack = self.detector.stack_type().await;
        self.read().for_stack(stack).min_rtt().cloned()
    }

    /// As [`get`](Self::get), skipping `exclude` unless it is the only
    /// server left.
    pub async fn get_excluding(&self, exclude: &str) -> Option<IpEntry> {
        let stack = self.detector.stack_type().await;
        let lists = self.read();
        let list = lists.for_stack(stack);
        list.iter()
            .filter(|ip| ip.addr != exclude)
            .min_by(|a, b| a.cmp_rtt(b))
            .or_else(|| list.min_rtt())
            .cloned()
    }

    /// Fold an RTT sample into the server's estimate. Unknown addresses are
    /// ignored.
    pub fn update(&self, addr: &str, sample_ms: u32) {
        let mut lists = self.write();
        let ServerLists { ipv4, ipv6 } = &mut *lists;
        let Some(entry) = ipv4.find_mut(addr).or_else(|| ipv6.find_mut(addr)) else {
            debug!(server = %addr, "RTT sample for unknown server ignored");
            return;
        };
        let previous = entry.rtt_ms;
        let next = ewma(previous, sample_ms);
        entry.rtt_ms = Some(next);
        debug!(server = %addr, sample_ms, previous = ?previous, rtt_ms = next, "Server RTT updated");
    }

    /// Add servers with an unset RTT; known ones keep their estimate.
    pub fn add_servers<S: AsRef<str>>(&self, ipv4: &[S], ipv6: &[S]) -> usize {
        let mut lists = self.write();
        lists.ipv4.merge_addrs(ipv4.iter().map(AsRef::as_ref))
            + lists.ipv6.merge_addrs(ipv6.iter().map(AsRef::as_ref))
    }

    /// Snapshot of the (IPv4, IPv6) server lists.
    pub fn servers(&self) -> (Vec<IpEntry>, Vec<IpEntry>) {
        let lists = self.read();
        (lists.ipv4.clone(), lists.ipv6.clone())
    }

    pub fn is_empty(&self) -> bool {
        let lists = self.read();
        lists.ipv4.is_empty() && lists.ipv6.is_empty()
    }

    pub fn clear(&self) {
        let mut lists = self.write();
        lists.ipv4.clear();
        lists.ipv6.clear();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ServerLists> {
        self.servers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ServerLists> {
        self.servers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ResolverScheduler for ServerScheduler {
    async fn get(&self) -> Option<IpEntry> {
        ServerScheduler::get(self).await
    }

    async fn get_excluding(&self, exclude: &str) -> Option<IpEntry> {
        ServerScheduler::get_excluding(self, exclude).await
    }

    fn update(&self, addr: &str, sample_ms: u32) {
        ServerScheduler::update(self, addr, sample_ms);
    }
}
