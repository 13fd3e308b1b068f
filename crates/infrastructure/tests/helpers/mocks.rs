use async_trait::async_trait;
use httpdns_application::ports::{HttpExchanger, HttpRequest, HttpResponse, StackDetector};
use httpdns_domain::{ClientConfig, DomainError, NetStackType};
use httpdns_infrastructure::dns::{JsonResponseParser, ServerScheduler, Sha256Signer};
use std::sync::{Arc, Mutex};

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

    pub fn servers(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.server.clone())
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
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

pub fn schedule_body(ipv4: &[&str], ipv6: &[&str]) -> String {
    format!(
        r#"{{"service_ip":[{}],"service_ipv6":[{}]}}"#,
        quoted(ipv4),
        quoted(ipv6)
    )
}

fn quoted(addrs: &[&str]) -> String {
    addrs
        .iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(",")
}

pub struct StaticDetector(pub NetStackType);

#[async_trait]
impl StackDetector for StaticDetector {
    async fn stack_type(&self) -> NetStackType {
        self.0
    }
}

pub fn config_with_boot(ipv4: &[&str], ipv6: &[&str]) -> ClientConfig {
    let mut config = ClientConfig::new("100000");
    config.boot_servers_ipv4 = ipv4.iter().map(|s| s.to_string()).collect();
    config.boot_servers_ipv6 = ipv6.iter().map(|s| s.to_string()).collect();
    config
}

pub fn scheduler(
    config: ClientConfig,
    stack: NetStackType,
    exchanger: Arc<ScriptedExchanger>,
) -> ServerScheduler {
    ServerScheduler::new(
        config,
        Arc::new(StaticDetector(stack)),
        exchanger,
        Arc::new(JsonResponseParser::new()),
        Arc::new(Sha256Signer::new()),
    )
}
