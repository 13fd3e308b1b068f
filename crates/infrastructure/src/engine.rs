use crate::dns::cache::ResultCache;
use crate::dns::forwarding::JsonResponseParser;
use crate::dns::scheduler::{BootServers, ServerScheduler};
use crate::dns::signing::Sha256Signer;
use crate::dns::transport::ReqwestExchanger;
use crate::system::{LocalResolver, NetStackDetector};
use httpdns_application::ports::{HttpExchanger, RequestSigner, ResponseParser, StackDetector};
use httpdns_application::use_cases::resolve::merge_results;
use httpdns_application::use_cases::{CompletionCallback, ResolveDeps, ResolveTask, TaskSettings};
use httpdns_domain::{
    ClientConfig, DomainError, QueryType, ResolveRequest, ResolveResult, MAX_HOSTS_PER_BATCH,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// HTTPDNS client handle.
///
/// Owns one cache, one scheduler and one set of collaborators. Cloning the
/// handle is not supported; share it behind an `Arc`.
pub struct HttpDnsClient {
    config: ClientConfig,
    deps: ResolveDeps,
    settings: TaskSettings,
    cache: Arc<ResultCache>,
    scheduler: Arc<ServerScheduler>,
    detector: Arc<dyn StackDetector>,
    boot: Arc<BootState>,
    local: LocalResolver,
}

impl HttpDnsClient {
    /// Validate `config` and wire the default collaborators: reqwest
    /// transport, JSON parser, SHA-256 signer and the UDP-probe stack
    /// detector.
    pub fn new(config: ClientConfig) -> Result<Self, DomainError> {
        let detector = Arc::new(NetStackDetector::from_config(&config));
        Self::with_components(
            config,
            Arc::new(ReqwestExchanger::new()),
            Arc::new(JsonResponseParser::new()),
            Arc::new(Sha256Signer::new()),
            detector,
        )
    }

    /// As [`new`](Self::new) with caller-supplied collaborators.
    pub fn with_components(
        config: ClientConfig,
        exchanger: Arc<dyn HttpExchanger>,
        parser: Arc<dyn ResponseParser>,
        signer: Arc<dyn RequestSigner>,
        detector: Arc<dyn StackDetector>,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        let cache = Arc::new(ResultCache::new());
        let scheduler = Arc::new(ServerScheduler::new(
            config.clone(),
            Arc::clone(&detector),
            Arc::clone(&exchanger),
            Arc::clone(&parser),
            Arc::clone(&signer),
        ));
        let deps = ResolveDeps {
            exchanger,
            parser,
            signer,
            detector: Arc::clone(&detector),
            cache: cache.clone(),
            scheduler: scheduler.clone(),
        };

        info!(
            account_id = %config.account_id,
            https = config.using_https,
            sign = config.using_sign,
            cache = config.using_cache,
            retry_times = config.retry_times,
            "HTTPDNS client created"
        );

        Ok(Self {
            settings: TaskSettings::from_config(&config),
            boot: Arc::new(BootState::new(BootServers::from_config(&config))),
            local: LocalResolver::new(
                config.local_fallback_ttl,
                Duration::from_millis(config.timeout_ms),
            ),
            config,
            deps,
            cache,
            scheduler,
            detector,
        })
    }

    /// Fetch the resolver-server list from the boot servers.
    pub async fn bootstrap(&self) -> Result<(), DomainError> {
        bootstrap_with(&self.scheduler, &self.boot).await
    }

    /// Resolve one request and return its first answer.
    ///
    /// `Ok(None)` means the retry budget ran out without an answer.
    pub async fn resolve(
        &self,
        request: ResolveRequest,
    ) -> Result<Option<ResolveResult>, DomainError> {
        let mut task = self.task();
        task.add_request(request, None)?;
        ensure_servers(&self.scheduler, &self.boot).await;
        task.execute().await?;

        Ok(task
            .into_contexts()
            .into_iter()
            .next()
            .and_then(|ctx| ctx.into_results().into_iter().next()))
    }

    pub async fn resolve_host(
        &self,
        host: &str,
        query_type: QueryType,
    ) -> Result<Option<ResolveResult>, DomainError> {
        self.resolve(self.request(host, query_type)).await
    }

    /// Resolve many hosts through batched requests of at most
    /// [`MAX_HOSTS_PER_BATCH`] hosts each, all driven by one task. Returns one
    /// result per answered host, sorted by host.
    pub async fn resolve_batch<S: AsRef<str>>(
        &self,
        hosts: &[S],
        query_type: QueryType,
    ) -> Result<Vec<ResolveResult>, DomainError> {
        let mut task = self.task();
        for chunk in hosts.chunks(MAX_HOSTS_PER_BATCH) {
            let request = ResolveRequest::batch(chunk, &self.config).with_query_type(query_type);
            if request.host.is_empty() {
                continue;
            }
            task.add_request(request, None)?;
        }
        if task.is_empty() {
            return Ok(Vec::new());
        }

        ensure_servers(&self.scheduler, &self.boot).await;
        task.execute().await?;
        Ok(merge_results(
            task.into_contexts()
                .into_iter()
                .flat_map(|ctx| ctx.into_results())
                .collect(),
        ))
    }

    /// Resolve on a background tokio task; `callback` fires once with the
    /// answers if the request completes.
    pub fn spawn_resolve(
        &self,
        request: ResolveRequest,
        callback: CompletionCallback,
    ) -> Result<JoinHandle<Result<(), DomainError>>, DomainError> {
        let mut task = self.task();
        task.add_request(request, Some(callback))?;
        let scheduler = Arc::clone(&self.scheduler);
        let boot = Arc::clone(&self.boot);

        Ok(tokio::spawn(async move {
            ensure_servers(&scheduler, &boot).await;
            task.execute().await
        }))
    }

    /// Empty task sharing this client's collaborators, for callers that
    /// drive several requests at once.
    pub fn task(&self) -> ResolveTask {
        ResolveTask::new(self.deps.clone(), self.settings.clone())
    }

    /// Resolve through HTTPDNS, then through the system resolver when
    /// HTTPDNS gives no answer. Fallback answers are not cached.
    pub async fn resolve_with_fallback(
        &self,
        host: &str,
        query_type: QueryType,
    ) -> Result<Option<ResolveResult>, DomainError> {
        match self.resolve_host(host, query_type).await {
            Ok(Some(result)) => return Ok(Some(result)),
            Ok(None) => debug!(host = %host, "HTTPDNS exhausted, using system resolver"),
            Err(DomainError::NoResolverAvailable) => {
                debug!(host = %host, "No resolver server, using system resolver")
            }
            Err(e) => return Err(e),
        }

        let query_type = match query_type {
            QueryType::Auto => QueryType::from_stack(self.detector.stack_type().await),
            other => other,
        };
        Ok(self.local.resolve(host, query_type).await)
    }

    pub fn request(&self, host: &str, query_type: QueryType) -> ResolveRequest {
        ResolveRequest::from_config(host, &self.config).with_query_type(query_type)
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn scheduler(&self) -> &Arc<ServerScheduler> {
        &self.scheduler
    }

    pub fn detector(&self) -> &Arc<dyn StackDetector> {
        &self.detector
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn boot_servers(&self) -> BootServers {
        self.boot.snapshot()
    }
}

/// Boot-server lists plus the gate that lets one lazy bootstrap run at a
/// time. No lock is held while a schedule request is in flight.
struct BootState {
    servers: Mutex<BootServers>,
    in_flight: AtomicBool,
    settled: Notify,
}

impl BootState {
    fn new(servers: BootServers) -> Self {
        Self {
            servers: Mutex::new(servers),
            in_flight: AtomicBool::new(false),
            settled: Notify::new(),
        }
    }

    fn snapshot(&self) -> BootServers {
        self.servers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn absorb(&self, learned: &BootServers) {
        self.servers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .absorb(learned);
    }
}

/// Clears the in-flight flag and wakes waiters, also when the bootstrapping
/// future is dropped early.
struct InFlightGuard<'a>(&'a BootState);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
        self.0.settled.notify_waiters();
    }
}

async fn bootstrap_with(
    scheduler: &ServerScheduler,
    boot: &BootState,
) -> Result<(), DomainError> {
    let mut snapshot = boot.snapshot();
    scheduler.bootstrap(&mut snapshot).await?;
    boot.absorb(&snapshot);
    Ok(())
}

/// Bootstrap once when no resolver server is known yet. Callers arriving
/// while a bootstrap is running wait for it instead of starting another.
async fn ensure_servers(scheduler: &ServerScheduler, boot: &BootState) {
    if !scheduler.is_empty() {
        return;
    }

    let settled = boot.settled.notified();
    if boot
        .in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        debug!("Waiting for in-flight bootstrap");
        settled.await;
        return;
    }

    let _guard = InFlightGuard(boot);
    if !scheduler.is_empty() {
        return;
    }
    if let Err(e) = bootstrap_with(scheduler, boot).await {
        warn!(error = %e, "Lazy bootstrap failed");
    }
}
