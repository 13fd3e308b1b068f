#![allow(dead_code)]

use async_trait::async_trait;
use httpdns_application::ports::{HttpExchanger, HttpRequest, HttpResponse, StackDetector};
use httpdns_domain::{ClientConfig, DomainError, NetStackType};
use httpdns_infrastructure::dns::{JsonResponseParser, Sha256Signer};
use httpdns_infrastructure::HttpDnsClient;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ACCOUNT: &str = "100000";
pub const BOOT_SERVER: &str = "203.0.113.1";
pub const SERVER_A: &str = "10.0.0.1";
pub const SERVER_B: &str = "10.0.0.2";

type Script = dyn Fn(&HttpRequest) -> Result<HttpResponse, DomainError> + Send + Sync;

// ============================================================================
// Scripted HTTPDNS service
// ============================================================================

/// Fake HTTPDNS service. Schedule requests list [`SERVER_A`] and
/// [`SERVER_B`]; resolve requests are answered by the script.
pub struct ScriptedService {
    schedule_status: u16,
    schedule_delay: Duration,
    script: Box<Script>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedService {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, DomainError> + Send + Sync + 'static,
    {
        Self {
            schedule_status: 200,
            schedule_delay: Duration::ZERO,
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_schedule_status(mut self, status: u16) -> Self {
        self.schedule_status = status;
        self
    }

    pub fn with_schedule_delay(mut self, delay: Duration) -> Self {
        self.schedule_delay = delay;
        self
    }

    pub fn schedule_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| is_schedule(&r.url))
            .collect()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn resolve_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !is_schedule(&r.url))
            .collect()
    }
}

#[async_trait]
impl HttpExchanger for ScriptedService {
    async fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        if is_schedule(&request.url) {
            if !self.schedule_delay.is_zero() {
                tokio::time::sleep(self.schedule_delay).await;
            }
            if self.schedule_status != 200 {
                return status(self.schedule_status);
            }
            return ok(format!(
                r#"{{"service_ip":["{SERVER_A}","{SERVER_B}"],"service_ipv6":["2001:db8::53"]}}"#
            ));
        }
        (self.script)(request)
    }
}

fn is_schedule(url: &str) -> bool {
    url.contains("/ss?")
}

pub fn ok(body: impl Into<String>) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse {
        status_code: 200,
        body: body.into(),
        round_trip_ms: 8,
    })
}

pub fn status(status_code: u16) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse {
        status_code,
        body: String::new(),
        round_trip_ms: 8,
    })
}

// ============================================================================
// URL and body helpers
// ============================================================================

pub fn param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn hosts_of(url: &str) -> Vec<String> {
    param(url, "host")
        .unwrap_or_default()
        .split(',')
        .map(str::to_string)
        .collect()
}

fn json_list(addrs: &[&str]) -> String {
    addrs
        .iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn single_body(host: &str, ips: &[&str], ipsv6: &[&str], ttl: u32) -> String {
    format!(
        r#"{{"host":"{host}","ips":[{}],"ipsv6":[{}],"ttl":{ttl},"origin_ttl":0,"client_ip":"198.51.100.7"}}"#,
        json_list(ips),
        json_list(ipsv6)
    )
}

/// One `dns` entry of a batched answer; `record_type` is 1 or 28.
pub fn multi_entry(host: &str, ips: &[&str], record_type: u16, ttl: u32) -> String {
    format!(
        r#"{{"host":"{host}","ips":[{}],"type":{record_type},"ttl":{ttl}}}"#,
        json_list(ips)
    )
}

pub fn multi_body(entries: &[String]) -> String {
    format!(r#"{{"dns":[{}]}}"#, entries.join(","))
}

/// Single-host answer for whatever family the URL asks for.
pub fn answer_for_query(request: &HttpRequest, ttl: u32) -> Result<HttpResponse, DomainError> {
    let host = hosts_of(&request.url).remove(0);
    let query = param(&request.url, "query");
    let ips: Vec<&str> = if query == Some("6") {
        Vec::new()
    } else {
        vec!["192.0.2.10"]
    };
    let ipsv6: Vec<&str> = if query == Some("4") {
        Vec::new()
    } else {
        vec!["2001:db8::10"]
    };
    ok(single_body(&host, &ips, &ipsv6, ttl))
}

// ============================================================================
// Client wiring
// ============================================================================

pub struct StaticDetector(pub NetStackType);

#[async_trait]
impl StackDetector for StaticDetector {
    async fn stack_type(&self) -> NetStackType {
        self.0
    }
}

pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new(ACCOUNT);
    config.boot_servers_ipv4 = vec![BOOT_SERVER.to_string()];
    config.boot_servers_ipv6 = Vec::new();
    config.retry_times = 1;
    config.platform = "linux".into();
    config.sdk_version = "test".into();
    config
}

pub struct TestClient {
    pub client: HttpDnsClient,
    pub service: Arc<ScriptedService>,
}

impl TestClient {
    pub fn new(service: ScriptedService) -> Self {
        Self::with_config(test_config(), NetStackType::Dual, service)
    }

    pub fn with_config(config: ClientConfig, stack: NetStackType, service: ScriptedService) -> Self {
        Self::try_with_config(config, stack, service).expect("valid test config")
    }

    pub fn try_with_config(
        config: ClientConfig,
        stack: NetStackType,
        service: ScriptedService,
    ) -> Result<Self, DomainError> {
        let service = Arc::new(service);
        let client = HttpDnsClient::with_components(
            config,
            service.clone(),
            Arc::new(JsonResponseParser::new()),
            Arc::new(Sha256Signer::new()),
            Arc::new(StaticDetector(stack)),
        )?;
        Ok(Self { client, service })
    }
}
