use crate::ip::{ip_list_from, IpEntry, IpList};
use crate::QueryType;
use std::time::{Duration, Instant};

/// Resolution answer; also the cache entry type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    pub host: String,
    pub cache_key: String,
    pub client_ip: Option<String>,
    pub extra: Option<String>,
    pub ips: Vec<IpEntry>,
    pub ipsv6: Vec<IpEntry>,
    /// Seconds.
    pub ttl: u32,
    /// Seconds; takes precedence over `ttl` for expiry when non-zero.
    pub origin_ttl: u32,
    pub query_timestamp: Instant,
    pub hit_cache: bool,
}

impl ResolveResult {
    pub fn new(host: impl Into<String>, cache_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            cache_key: cache_key.into(),
            client_ip: None,
            extra: None,
            ips: Vec::new(),
            ipsv6: Vec::new(),
            ttl: 0,
            origin_ttl: 0,
            query_timestamp: Instant::now(),
            hit_cache: false,
        }
    }

    /// Convert a parsed answer, stamping it with `now`.
    pub fn from_answer(answer: ResolveAnswer, cache_key: impl Into<String>, now: Instant) -> Self {
        Self {
            cache_key: cache_key.into(),
            client_ip: answer.client_ip,
            extra: answer.extra,
            ips: ip_list_from(answer.ips.iter().map(String::as_str)),
            ipsv6: ip_list_from(answer.ipsv6.iter().map(String::as_str)),
            ttl: answer.ttl,
            origin_ttl: answer.origin_ttl,
            query_timestamp: now,
            hit_cache: false,
            host: answer.host,
        }
    }

    pub fn with_ips<'a, I: IntoIterator<Item = &'a str>>(mut self, ips: I) -> Self {
        self.ips = ip_list_from(ips);
        self
    }

    pub fn with_ipsv6<'a, I: IntoIterator<Item = &'a str>>(mut self, ipsv6: I) -> Self {
        self.ipsv6 = ip_list_from(ipsv6);
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_origin_ttl(mut self, origin_ttl: u32) -> Self {
        self.origin_ttl = origin_ttl;
        self
    }

    pub fn with_timestamp(mut self, query_timestamp: Instant) -> Self {
        self.query_timestamp = query_timestamp;
        self
    }

    pub fn effective_ttl(&self) -> u32 {
        if self.origin_ttl > 0 {
            self.origin_ttl
        } else {
            self.ttl
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.query_timestamp + Duration::from_secs(u64::from(self.effective_ttl()))
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.ipsv6.is_empty()
    }

    /// True when the entry holds every family `query_type` asks for.
    pub fn satisfies(&self, query_type: QueryType) -> bool {
        (!query_type.wants_ipv4() || !self.ips.is_empty())
            && (!query_type.wants_ipv6() || !self.ipsv6.is_empty())
    }

    /// Narrowed type still needed to complete a `query_type` request, or
    /// `None` when nothing is missing.
    pub fn missing_type(&self, query_type: QueryType) -> Option<QueryType> {
        let need_v4 = query_type.wants_ipv4() && self.ips.is_empty();
        let need_v6 = query_type.wants_ipv6() && self.ipsv6.is_empty();
        match (need_v4, need_v6) {
            (true, true) => Some(QueryType::Both),
            (true, false) => Some(QueryType::A),
            (false, true) => Some(QueryType::AAAA),
            (false, false) => None,
        }
    }

    /// Move the first address of each family to the back.
    pub fn rotate(&mut self) {
        self.ips.rotate_one();
        self.ipsv6.rotate_one();
    }

    /// Copy in each family this entry lacks and `other` has.
    pub fn fill_gaps_from(&mut self, other: &ResolveResult) {
        if self.ips.is_empty() && !other.ips.is_empty() {
            self.ips = other.ips.clone();
        }
        if self.ipsv6.is_empty() && !other.ipsv6.is_empty() {
            self.ipsv6 = other.ipsv6.clone();
        }
    }

    /// Fold a duplicate answer for the same host into this one: fill gaps and
    /// keep the largest TTLs seen.
    pub fn absorb_duplicate(&mut self, other: &ResolveResult) {
        self.fill_gaps_from(other);
        self.ttl = self.ttl.max(other.ttl);
        self.origin_ttl = self.origin_ttl.max(other.origin_ttl);
        if self.client_ip.is_none() {
            self.client_ip = other.client_ip.clone();
        }
        if self.extra.is_none() {
            self.extra = other.extra.clone();
        }
    }
}

/// Structured answer as produced by the response parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveAnswer {
    pub host: String,
    pub ips: Vec<String>,
    pub ipsv6: Vec<String>,
    pub ttl: u32,
    pub origin_ttl: u32,
    pub client_ip: Option<String>,
    pub extra: Option<String>,
}

impl ResolveAnswer {
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.ipsv6.is_empty()
    }
}

/// Resolver-server set returned by a schedule exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleAnswer {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

impl ScheduleAnswer {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}
