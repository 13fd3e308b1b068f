use chrono::Utc;
use httpdns_domain::{
    ClientConfig, DomainError, NetStackType, QueryType, ResolveAnswer, ResolveRequest,
    ResolveResult,
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::merge::merge_results;
use super::query_url::QueryUrlBuilder;
use crate::ports::{
    AnswerCache, HttpExchanger, HttpRequest, HttpResponse, RequestSigner, ResolverScheduler,
    ResponseParser, StackDetector,
};

/// Called once with every answer of a completed request.
pub type CompletionCallback = Box<dyn FnOnce(&[ResolveResult]) + Send + 'static>;

/// Collaborators a resolve task drives.
#[derive(Clone)]
pub struct ResolveDeps {
    pub exchanger: Arc<dyn HttpExchanger>,
    pub parser: Arc<dyn ResponseParser>,
    pub signer: Arc<dyn RequestSigner>,
    pub detector: Arc<dyn StackDetector>,
    pub cache: Arc<dyn AnswerCache>,
    pub scheduler: Arc<dyn ResolverScheduler>,
}

#[derive(Debug, Clone)]
pub struct TaskSettings {
    /// Extra rounds a request gets after its first failed exchange.
    pub retry_times: u32,
    pub platform: String,
    pub sdk_version: String,
    pub sign_offset: Duration,
}

impl TaskSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            retry_times: config.retry_times,
            platform: config.platform.clone(),
            sdk_version: config.sdk_version.clone(),
            sign_offset: Duration::from_secs(config.sign_offset_secs),
        }
    }
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Pending,
    /// Callback fired with a real answer.
    Completed,
    /// Retry budget spent without an answer; the callback never fires.
    Exhausted,
}

/// A request paired with the answers it accumulates.
pub struct ResolveContext {
    request: ResolveRequest,
    results: Vec<ResolveResult>,
    callback: Option<CompletionCallback>,
    state: ResolveState,
    attempts_left: u32,
    /// Type sent on the wire; narrower than the request's after a partial hit.
    query_type: QueryType,
    /// Cached half of a partial hit. Dropped unanswered if the narrowed
    /// query is exhausted; no partial answer is ever reported.
    cached_partial: Option<ResolveResult>,
    last_failed: Option<String>,
}

impl ResolveContext {
    fn new(request: ResolveRequest, callback: Option<CompletionCallback>, attempts: u32) -> Self {
        Self {
            query_type: request.query_type,
            request,
            results: Vec::new(),
            callback,
            state: ResolveState::Pending,
            attempts_left: attempts,
            cached_partial: None,
            last_failed: None,
        }
    }

    pub fn request(&self) -> &ResolveRequest {
        &self.request
    }

    pub fn results(&self) -> &[ResolveResult] {
        &self.results
    }

    pub fn state(&self) -> ResolveState {
        self.state
    }

    pub fn into_results(self) -> Vec<ResolveResult> {
        self.results
    }

    fn is_runnable(&self) -> bool {
        self.state == ResolveState::Pending && self.attempts_left > 0
    }

    fn complete(&mut self, results: Vec<ResolveResult>) {
        self.results.extend(results);
        self.state = ResolveState::Completed;
        if let Some(callback) = self.callback.take() {
            callback(&self.results);
        }
    }
}

impl fmt::Debug for ResolveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("host", &self.request.host)
            .field("state", &self.state)
            .field("query_type", &self.query_type)
            .field("attempts_left", &self.attempts_left)
            .field("results", &self.results.len())
            .finish()
    }
}

/// One HTTP exchange built for a context in a given round.
struct ResolveParam {
    context: usize,
    request: ResolveRequest,
    http: HttpRequest,
}

/// Drives one or many requests through cache probe, network rounds and
/// retries until every request is Completed or Exhausted.
///
/// Requests advance round by round together, so a failing request never
/// delays another one's completion.
pub struct ResolveTask {
    deps: ResolveDeps,
    settings: TaskSettings,
    contexts: Vec<ResolveContext>,
}

impl ResolveTask {
    pub fn new(deps: ResolveDeps, settings: TaskSettings) -> Self {
        Self {
            deps,
            settings,
            contexts: Vec::new(),
        }
    }

    /// Queue a request; returns its context index.
    pub fn add_request(
        &mut self,
        request: ResolveRequest,
        callback: Option<CompletionCallback>,
    ) -> Result<usize, DomainError> {
        request.validate()?;
        let attempts = self.settings.retry_times.saturating_add(1);
        self.contexts
            .push(ResolveContext::new(request, callback, attempts));
        Ok(self.contexts.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn contexts(&self) -> &[ResolveContext] {
        &self.contexts
    }

    pub fn into_contexts(self) -> Vec<ResolveContext> {
        self.contexts
    }

    /// Run to quiescence. Succeeds once every request is Completed or
    /// Exhausted; fails only when no resolver server can be drawn at all.
    #[instrument(skip(self), fields(requests = self.contexts.len()))]
    pub async fn execute(&mut self) -> Result<(), DomainError> {
        let mut stack = None;
        for index in 0..self.contexts.len() {
            if self.contexts[index].state != ResolveState::Pending {
                continue;
            }
            self.prepare(index, &mut stack).await?;
            self.probe_cache(index);
        }

        let mut round = 0u32;
        loop {
            let params = self.build_round(round).await;
            if params.is_empty() {
                break;
            }
            debug!(round, exchanges = params.len(), "Starting network round");
            self.run_round(params).await;
            round += 1;
        }

        for ctx in &mut self.contexts {
            if ctx.state == ResolveState::Pending {
                ctx.state = ResolveState::Exhausted;
                warn!(
                    host = %ctx.request.host,
                    retry_times = self.settings.retry_times,
                    "Resolution exhausted retry budget"
                );
            }
        }
        Ok(())
    }

    async fn prepare(
        &mut self,
        index: usize,
        stack: &mut Option<NetStackType>,
    ) -> Result<(), DomainError> {
        if self.contexts[index].request.resolver.is_none() {
            let server = self
                .deps
                .scheduler
                .get()
                .await
                .ok_or(DomainError::NoResolverAvailable)?;
            self.contexts[index].request.resolver = Some(server.addr);
        }

        if self.contexts[index].request.query_type == QueryType::Auto {
            let detected = match *stack {
                Some(detected) => detected,
                None => {
                    let detected = self.deps.detector.stack_type().await;
                    *stack = Some(detected);
                    detected
                }
            };
            let resolved = QueryType::from_stack(detected);
            debug!(stack = %detected, query_type = %resolved, "Resolved AUTO query type");
            let ctx = &mut self.contexts[index];
            ctx.request.query_type = resolved;
            ctx.query_type = resolved;
        }
        Ok(())
    }

    fn probe_cache(&mut self, index: usize) {
        let ctx = &mut self.contexts[index];
        if !ctx.request.using_cache || ctx.request.using_multi {
            return;
        }
        let key = ctx.request.cache_key_for(&ctx.request.host).to_string();
        let Some(mut hit) = self.deps.cache.lookup(&key, ctx.query_type) else {
            debug!(key = %key, "Cache MISS");
            return;
        };

        match hit.missing_type(ctx.query_type) {
            None => {
                debug!(key = %key, "Cache HIT");
                self.deps.cache.rotate(&key);
                hit.hit_cache = true;
                ctx.complete(vec![hit]);
            }
            Some(missing) => {
                debug!(key = %key, missing = %missing, "Partial cache HIT, narrowing query");
                ctx.query_type = missing;
                ctx.cached_partial = Some(hit);
            }
        }
    }

    async fn build_round(&mut self, round: u32) -> Vec<ResolveParam> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let mut params = Vec::new();

        for index in 0..self.contexts.len() {
            if !self.contexts[index].is_runnable() {
                continue;
            }

            let failed = if round > 0 {
                self.contexts[index].last_failed.take()
            } else {
                None
            };
            if let Some(failed) = failed {
                match self.deps.scheduler.get_excluding(&failed).await {
                    Some(server) => {
                        debug!(failed = %failed, next = %server.addr, "Switching resolver server");
                        self.contexts[index].request.resolver = Some(server.addr);
                    }
                    None => {
                        self.contexts[index].attempts_left = 0;
                        continue;
                    }
                }
            }

            let ctx = &mut self.contexts[index];
            ctx.attempts_left -= 1;
            let Some(server) = ctx.request.resolver.clone() else {
                continue;
            };

            let mut request = ctx.request.clone();
            request.query_type = ctx.query_type;
            let url = QueryUrlBuilder::new(
                self.deps.signer.as_ref(),
                &self.settings.platform,
                &self.settings.sdk_version,
                self.settings.sign_offset,
            )
            .resolve_url(&request, &server, ctx.query_type, now);
            let http = HttpRequest::new(url, server, Duration::from_millis(request.timeout_ms));

            params.push(ResolveParam {
                context: index,
                request,
                http,
            });
        }
        params
    }

    /// Exchange every param of the round, then merge all answers of the
    /// round together so a host answered by several exchanges ends up as one
    /// result carrying every family.
    async fn run_round(&mut self, params: Vec<ResolveParam>) {
        let requests: Vec<HttpRequest> = params.iter().map(|p| p.http.clone()).collect();
        let responses = self.deps.exchanger.batch_exchange(&requests).await;
        let now = Instant::now();

        let mut round_results = Vec::new();
        // Hosts each context's own exchange answered this round.
        let mut answered: Vec<(usize, Vec<String>)> = Vec::new();
        for (param, response) in params.into_iter().zip(responses) {
            let server = &param.http.server;
            match self.answers_from(&param, response) {
                Some((answers, round_trip_ms)) => {
                    self.deps.scheduler.update(server, round_trip_ms);
                    let hosts: Vec<String> = answers.iter().map(|a| a.host.clone()).collect();
                    round_results.extend(answers.into_iter().map(|answer| {
                        let key = param.request.cache_key_for(&answer.host).to_string();
                        ResolveResult::from_answer(answer, key, now)
                    }));
                    answered.push((param.context, hosts));
                }
                None => {
                    let penalty = u32::try_from(param.request.timeout_ms).unwrap_or(u32::MAX);
                    self.deps.scheduler.update(server, penalty);
                    self.contexts[param.context].last_failed = Some(server.clone());
                }
            }
        }
        if answered.is_empty() {
            return;
        }

        let merged = merge_results(round_results);
        for (index, hosts) in answered {
            let ctx = &mut self.contexts[index];
            let mut results: Vec<ResolveResult> = merged
                .iter()
                .filter(|r| hosts.contains(&r.host))
                .map(|r| {
                    let mut result = r.clone();
                    result.cache_key = ctx.request.cache_key_for(&result.host).to_string();
                    result
                })
                .collect();
            if let Some(partial) = ctx.cached_partial.take() {
                for result in results
                    .iter_mut()
                    .filter(|r| r.cache_key == partial.cache_key)
                {
                    result.fill_gaps_from(&partial);
                }
            }
            if ctx.request.using_cache {
                for result in &results {
                    self.deps.cache.store(result);
                }
            }
            debug!(host = %ctx.request.host, answers = results.len(), "Resolution completed");
            ctx.complete(results);
        }
    }

    /// Usable answers and the exchange latency, or `None` when the exchange
    /// has to be retried.
    fn answers_from(
        &self,
        param: &ResolveParam,
        response: Result<HttpResponse, DomainError>,
    ) -> Option<(Vec<ResolveAnswer>, u32)> {
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(server = %param.http.server, host = %param.request.host, error = %e, "Exchange failed");
                return None;
            }
        };
        if !response.is_ok() {
            warn!(
                server = %param.http.server,
                host = %param.request.host,
                status = response.status_code,
                "Resolver server returned error status"
            );
            return None;
        }

        let answers: Vec<ResolveAnswer> = if param.request.using_multi {
            self.deps.parser.parse_multi(&response.body)
        } else {
            self.deps
                .parser
                .parse_single(&response.body)
                .map(|mut answer| {
                    if answer.host.is_empty() {
                        answer.host = param.request.host.clone();
                    }
                    answer
                })
                .into_iter()
                .collect()
        };
        let answers: Vec<ResolveAnswer> = answers.into_iter().filter(|a| !a.is_empty()).collect();

        if answers.is_empty() {
            debug!(server = %param.http.server, host = %param.request.host, "Response carried no usable answer");
            return None;
        }
        Some((answers, response.round_trip_ms))
    }
}
