use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Invalid resolve request: {0}")]
    InvalidRequest(String),

    #[error("No resolver server available")]
    NoResolverAvailable,

    #[error("Bootstrap failed: none of {0} boot servers answered")]
    BootstrapFailed(usize),

    #[error("Cache entry already exists: {0}")]
    CacheEntryExists(String),

    #[error("Invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("HTTP exchange failed: {0}")]
    Http(String),

    #[error("HTTP exchange timeout after {0}ms")]
    Timeout(u64),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
