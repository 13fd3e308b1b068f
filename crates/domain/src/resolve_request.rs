use crate::config::ClientConfig;
use crate::{DomainError, QueryType};
use std::collections::BTreeMap;

/// Maximum number of hosts carried by one batched request.
pub const MAX_HOSTS_PER_BATCH: usize = 5;

/// One logical lookup.
///
/// In batched mode (`using_multi`) `host` holds a comma-separated host list
/// and answers are keyed per returned host, so `cache_key` must stay unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub host: String,
    pub account_id: String,
    pub secret_key: Option<String>,
    /// Resolver server address; drawn from the scheduler when unset.
    pub resolver: Option<String>,
    pub query_type: QueryType,
    pub client_ip: Option<String>,
    pub using_https: bool,
    pub using_sign: bool,
    pub using_multi: bool,
    pub using_cache: bool,
    pub timeout_ms: u64,
    pub cache_key: Option<String>,
    /// SDNS extra parameters, sent as `sdns-<key>=<value>`.
    pub sdns_params: BTreeMap<String, String>,
}

impl ResolveRequest {
    pub fn new(host: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            account_id: account_id.into(),
            secret_key: None,
            resolver: None,
            query_type: QueryType::Auto,
            client_ip: None,
            using_https: true,
            using_sign: false,
            using_multi: false,
            using_cache: true,
            timeout_ms: 2500,
            cache_key: None,
            sdns_params: BTreeMap::new(),
        }
    }

    /// Request pre-filled from client defaults.
    pub fn from_config(host: impl Into<String>, config: &ClientConfig) -> Self {
        Self {
            secret_key: config.secret_key.clone(),
            using_https: config.using_https,
            using_sign: config.using_sign,
            using_cache: config.using_cache,
            timeout_ms: config.timeout_ms,
            ..Self::new(host, config.account_id.clone())
        }
    }

    /// Batched request for up to [`MAX_HOSTS_PER_BATCH`] hosts.
    pub fn batch<S: AsRef<str>>(hosts: &[S], config: &ClientConfig) -> Self {
        let joined = hosts
            .iter()
            .map(|h| h.as_ref().trim())
            .filter(|h| !h.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let mut request = Self::from_config(joined, config);
        request.using_multi = true;
        request
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn with_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.resolver = Some(resolver.into());
        self
    }

    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = Some(cache_key.into());
        self
    }

    pub fn with_cache(mut self, using_cache: bool) -> Self {
        self.using_cache = using_cache;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_signing(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self.using_sign = true;
        self
    }

    pub fn with_sdns_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sdns_params.insert(key.into(), value.into());
        self
    }

    /// Hosts named by this request (one unless batched).
    pub fn hosts(&self) -> Vec<&str> {
        if self.using_multi {
            self.host
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .collect()
        } else {
            vec![self.host.as_str()]
        }
    }

    /// Key the answer for `host` is stored under.
    pub fn cache_key_for<'a>(&'a self, host: &'a str) -> &'a str {
        match &self.cache_key {
            Some(key) if !self.using_multi && !key.is_empty() => key,
            _ => host,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.host.trim().is_empty() {
            return Err(DomainError::InvalidHost("host cannot be empty".into()));
        }
        if self.account_id.is_empty() {
            return Err(DomainError::InvalidRequest("account id is missing".into()));
        }
        if self.using_multi {
            if self.cache_key.is_some() {
                return Err(DomainError::InvalidRequest(
                    "batched requests cannot carry a cache key".into(),
                ));
            }
            let count = self.hosts().len();
            if count > MAX_HOSTS_PER_BATCH {
                return Err(DomainError::InvalidRequest(format!(
                    "batched request holds {count} hosts, limit is {MAX_HOSTS_PER_BATCH}"
                )));
            }
        }
        if self.using_sign && self.secret_key.as_deref().map_or(true, str::is_empty) {
            return Err(DomainError::InvalidRequest(
                "signing enabled without a secret key".into(),
            ));
        }
        Ok(())
    }
}
