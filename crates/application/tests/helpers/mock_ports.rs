use async_trait::async_trait;
use httpdns_application::ports::{
    AnswerCache, HttpExchanger, HttpRequest, HttpResponse, RequestSigner, ResolverScheduler,
    ResponseParser, Signature, StackDetector,
};
use httpdns_application::use_cases::{ResolveDeps, ResolveTask, TaskSettings};
use httpdns_domain::{
    DomainError, IpEntry, IpList, NetStackType, QueryType, ResolveAnswer, ResolveResult,
    ScheduleAnswer,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Scripted HTTP exchanger
// ============================================================================

type Script = dyn Fn(&HttpRequest) -> Result<HttpResponse, DomainError> + Send + Sync;

/// Answers every exchange through a closure and records the requests.
pub struct ScriptedExchanger {
    script: Box<Script>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedExchanger {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, DomainError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls_for(&self, host: &str) -> Vec<String> {
        let needle = format!("host={host}&");
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(&needle))
            .map(|r| r.url)
            .collect()
    }
}

#[async_trait]
impl HttpExchanger for ScriptedExchanger {
    async fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(request)
    }
}

pub fn ok(body: impl Into<String>, round_trip_ms: u32) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse {
        status_code: 200,
        body: body.into(),
        round_trip_ms,
    })
}

pub fn status(status_code: u16) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse {
        status_code,
        body: String::new(),
        round_trip_ms: 5,
    })
}

// ============================================================================
// Line-format parser
// ============================================================================

/// Parses `host|ipv4,ipv4|ipv6|ttl`; batched bodies separate answers with `;`.
pub struct LineParser;

impl LineParser {
    fn answer(line: &str) -> Option<ResolveAnswer> {
        let mut fields = line.split('|');
        let host = fields.next()?.trim().to_string();
        let list = |field: Option<&str>| -> Vec<String> {
            field
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };
        let ips = list(fields.next());
        let ipsv6 = list(fields.next());
        let ttl = fields.next()?.trim().parse().ok()?;
        Some(ResolveAnswer {
            host,
            ips,
            ipsv6,
            ttl,
            ..Default::default()
        })
    }
}

impl ResponseParser for LineParser {
    fn parse_schedule(&self, _body: &str) -> ScheduleAnswer {
        ScheduleAnswer::default()
    }

    fn parse_single(&self, body: &str) -> Option<ResolveAnswer> {
        Self::answer(body)
    }

    fn parse_multi(&self, body: &str) -> Vec<ResolveAnswer> {
        body.split(';').filter_map(Self::answer).collect()
    }
}

// ============================================================================
// Signer / detector
// ============================================================================

pub struct EchoSigner;

impl RequestSigner for EchoSigner {
    fn sign(&self, subject: &str, _secret: &str, max_offset: Duration, now: u64) -> Signature {
        Signature {
            signature: format!("sig-{subject}"),
            timestamp: now + max_offset.as_secs(),
        }
    }
}

pub struct StaticDetector {
    stack: NetStackType,
    calls: AtomicUsize,
}

impl StaticDetector {
    pub fn new(stack: NetStackType) -> Self {
        Self {
            stack,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StackDetector for StaticDetector {
    async fn stack_type(&self) -> NetStackType {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.stack
    }
}

// ============================================================================
// Scheduler / cache
// ============================================================================

/// Fixed server list; records every RTT sample.
pub struct MockScheduler {
    servers: Mutex<Vec<IpEntry>>,
    samples: Mutex<Vec<(String, u32)>>,
}

impl MockScheduler {
    pub fn new(servers: &[&str]) -> Self {
        Self {
            servers: Mutex::new(servers.iter().map(|s| IpEntry::new(*s)).collect()),
            samples: Mutex::new(Vec::new()),
        }
    }

    pub fn samples(&self) -> Vec<(String, u32)> {
        self.samples.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResolverScheduler for MockScheduler {
    async fn get(&self) -> Option<IpEntry> {
        self.servers.lock().unwrap().first().cloned()
    }

    async fn get_excluding(&self, exclude: &str) -> Option<IpEntry> {
        let servers = self.servers.lock().unwrap();
        servers
            .iter()
            .find(|s| s.addr != exclude)
            .or_else(|| servers.first())
            .cloned()
    }

    fn update(&self, addr: &str, sample_ms: u32) {
        self.samples
            .lock()
            .unwrap()
            .push((addr.to_string(), sample_ms));
        if let Some(entry) = self.servers.lock().unwrap().find_mut(addr) {
            entry.rtt_ms = Some(sample_ms);
        }
    }
}

/// Map-backed cache with no expiry.
#[derive(Default)]
pub struct MockCache {
    entries: Mutex<HashMap<String, ResolveResult>>,
    rotations: AtomicUsize,
    stores: AtomicUsize,
}

impl MockCache {
    pub fn insert(&self, entry: ResolveResult) {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.cache_key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<ResolveResult> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn rotations(&self) -> usize {
        self.rotations.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

impl AnswerCache for MockCache {
    fn lookup(&self, key: &str, query_type: QueryType) -> Option<ResolveResult> {
        let entry = self.get(key)?;
        let usable = match query_type {
            QueryType::A => !entry.ips.is_empty(),
            QueryType::AAAA => !entry.ipsv6.is_empty(),
            QueryType::Both | QueryType::Auto => !entry.is_empty(),
        };
        usable.then_some(entry)
    }

    fn rotate(&self, key: &str) {
        self.rotations.fetch_add(1, Ordering::SeqCst);
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.rotate();
        }
    }

    fn store(&self, entry: &ResolveResult) {
        self.stores.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&entry.cache_key) {
            Some(stored) => {
                stored.fill_gaps_from(entry);
                stored.ttl = entry.ttl;
                stored.origin_ttl = entry.origin_ttl;
            }
            None => {
                entries.insert(entry.cache_key.clone(), entry.clone());
            }
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub exchanger: Arc<ScriptedExchanger>,
    pub detector: Arc<StaticDetector>,
    pub scheduler: Arc<MockScheduler>,
    pub cache: Arc<MockCache>,
}

impl Harness {
    pub fn new(exchanger: ScriptedExchanger, servers: &[&str]) -> Self {
        Self {
            exchanger: Arc::new(exchanger),
            detector: Arc::new(StaticDetector::new(NetStackType::Dual)),
            scheduler: Arc::new(MockScheduler::new(servers)),
            cache: Arc::new(MockCache::default()),
        }
    }

    pub fn with_stack(mut self, stack: NetStackType) -> Self {
        self.detector = Arc::new(StaticDetector::new(stack));
        self
    }

    pub fn deps(&self) -> ResolveDeps {
        ResolveDeps {
            exchanger: self.exchanger.clone(),
            parser: Arc::new(LineParser),
            signer: Arc::new(EchoSigner),
            detector: self.detector.clone(),
            cache: self.cache.clone(),
            scheduler: self.scheduler.clone(),
        }
    }

    pub fn task(&self) -> ResolveTask {
        ResolveTask::new(
            self.deps(),
            TaskSettings {
                retry_times: 1,
                platform: "linux".into(),
                sdk_version: "test".into(),
                sign_offset: Duration::from_secs(600),
            },
        )
    }
}
