use async_trait::async_trait;
use httpdns_application::ports::{HttpExchanger, HttpRequest, HttpResponse};
use httpdns_domain::DomainError;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared HTTP client with connection pooling. Per-exchange limits are set on
/// each request.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// `HttpExchanger` over reqwest.
///
/// Any status code is a successful exchange; only transport failures and
/// timeouts are errors.
#[derive(Debug, Clone, Default)]
pub struct ReqwestExchanger;

impl ReqwestExchanger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HttpExchanger for ReqwestExchanger {
    async fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, DomainError> {
        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);
        debug!(server = %request.server, url = %request.url, "Sending HTTPDNS request");

        let started = Instant::now();
        let exchange = async {
            let response = SHARED_CLIENT
                .get(&request.url)
                .timeout(request.timeout)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status_code, body) = tokio::time::timeout(request.timeout, exchange)
            .await
            .map_err(|_| DomainError::Timeout(timeout_ms))?
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::Timeout(timeout_ms)
                } else {
                    DomainError::Http(format!("request to {} failed: {}", request.server, e))
                }
            })?;
        let round_trip_ms = u32::try_from(started.elapsed().as_millis()).unwrap_or(u32::MAX);

        debug!(
            server = %request.server,
            status = status_code,
            round_trip_ms,
            body_len = body.len(),
            "HTTPDNS response received"
        );

        Ok(HttpResponse {
            status_code,
            body,
            round_trip_ms,
        })
    }
}
