use async_trait::async_trait;
use httpdns_domain::NetStackType;

/// Reports the local IP-stack capability.
#[async_trait]
pub trait StackDetector: Send + Sync {
    async fn stack_type(&self) -> NetStackType;
}
