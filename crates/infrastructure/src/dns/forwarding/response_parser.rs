use httpdns_application::ports::ResponseParser;
use httpdns_domain::{ResolveAnswer, ScheduleAnswer};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Record type marking an IPv6 entry in a batched answer.
const TYPE_AAAA: u16 = 28;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScheduleBody {
    service_ip: Vec<String>,
    service_ipv6: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SingleBody {
    host: String,
    ips: Vec<String>,
    ipsv6: Vec<String>,
    ttl: u32,
    origin_ttl: u32,
    client_ip: Option<String>,
    extra: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MultiBody {
    dns: Vec<MultiEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MultiEntry {
    host: String,
    ips: Vec<String>,
    ipsv6: Vec<String>,
    #[serde(rename = "type")]
    record_type: u16,
    ttl: u32,
    origin_ttl: u32,
    client_ip: Option<String>,
}

impl Default for MultiEntry {
    fn default() -> Self {
        Self {
            host: String::new(),
            ips: Vec::new(),
            ipsv6: Vec::new(),
            record_type: 1,
            ttl: 0,
            origin_ttl: 0,
            client_ip: None,
        }
    }
}

/// Parses the JSON bodies returned by HTTPDNS servers.
///
/// Missing fields take their zero value; a body that is not the expected
/// JSON shape parses to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    pub fn new() -> Self {
        Self
    }

    fn decode<'a, T: Deserialize<'a>>(body: &'a str, kind: &'static str) -> Option<T> {
        match serde_json::from_str(body) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!(kind, error = %e, body_len = body.len(), "Unparsable HTTPDNS body");
                None
            }
        }
    }
}

impl ResponseParser for JsonResponseParser {
    fn parse_schedule(&self, body: &str) -> ScheduleAnswer {
        let Some(decoded) = Self::decode::<ScheduleBody>(body, "schedule") else {
            return ScheduleAnswer::default();
        };
        ScheduleAnswer {
            ipv4: non_empty(decoded.service_ip),
            ipv6: non_empty(decoded.service_ipv6),
        }
    }

    fn parse_single(&self, body: &str) -> Option<ResolveAnswer> {
        let decoded = Self::decode::<SingleBody>(body, "single")?;
        Some(ResolveAnswer {
            host: decoded.host,
            ips: non_empty(decoded.ips),
            ipsv6: non_empty(decoded.ipsv6),
            ttl: decoded.ttl,
            origin_ttl: decoded.origin_ttl,
            client_ip: decoded.client_ip.filter(|ip| !ip.is_empty()),
            extra: decoded.extra.and_then(extra_text),
        })
    }

    fn parse_multi(&self, body: &str) -> Vec<ResolveAnswer> {
        let Some(decoded) = Self::decode::<MultiBody>(body, "multi") else {
            return Vec::new();
        };
        decoded
            .dns
            .into_iter()
            .filter(|entry| !entry.host.is_empty())
            .map(|entry| {
                let (ips, mut ipsv6) = if entry.record_type == TYPE_AAAA {
                    (Vec::new(), non_empty(entry.ips))
                } else {
                    (non_empty(entry.ips), Vec::new())
                };
                for addr in non_empty(entry.ipsv6) {
                    if !ipsv6.contains(&addr) {
                        ipsv6.push(addr);
                    }
                }
                ResolveAnswer {
                    host: entry.host,
                    ips,
                    ipsv6,
                    ttl: entry.ttl,
                    origin_ttl: entry.origin_ttl,
                    client_ip: entry.client_ip.filter(|ip| !ip.is_empty()),
                    extra: None,
                }
            })
            .collect()
    }
}

fn non_empty(addrs: Vec<String>) -> Vec<String> {
    addrs.into_iter().filter(|a| !a.is_empty()).collect()
}

fn extra_text(extra: Value) -> Option<String> {
    match extra {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
