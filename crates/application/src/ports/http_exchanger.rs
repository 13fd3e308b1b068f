use async_trait::async_trait;
use futures::future::join_all;
use httpdns_domain::DomainError;
use std::time::Duration;

pub const HTTP_OK: u16 = 200;

/// One outgoing GET exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Server address the exchange targets, reported back to the scheduler.
    pub server: String,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            server: server.into(),
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub round_trip_ms: u32,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status_code == HTTP_OK
    }
}

/// HTTP transport port. Only status, body and measured latency are visible to
/// the engine; TLS and connection handling stay behind the implementation.
#[async_trait]
pub trait HttpExchanger: Send + Sync {
    async fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, DomainError>;

    /// Drive every exchange concurrently. Responses come back in request order.
    async fn batch_exchange(
        &self,
        requests: &[HttpRequest],
    ) -> Vec<Result<HttpResponse, DomainError>> {
        join_all(requests.iter().map(|request| self.exchange(request))).await
    }
}
