use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address families requested from the resolver server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    A,
    AAAA,
    Both,
    /// Resolved at run time from the detected IP stack.
    #[default]
    Auto,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::A => "A",
            QueryType::AAAA => "AAAA",
            QueryType::Both => "BOTH",
            QueryType::Auto => "AUTO",
        }
    }

    /// Literal token sent in the `query=` parameter. `Auto` must be resolved
    /// before it reaches the wire; it is sent as both families if it does.
    pub fn wire_token(&self) -> &'static str {
        match self {
            QueryType::A => "4",
            QueryType::AAAA => "6",
            QueryType::Both | QueryType::Auto => "4,6",
        }
    }

    pub fn wants_ipv4(&self) -> bool {
        !matches!(self, QueryType::AAAA)
    }

    pub fn wants_ipv6(&self) -> bool {
        !matches!(self, QueryType::A)
    }

    /// AUTO resolution: IPv4-only → A, IPv6-only → AAAA, anything else → BOTH.
    pub fn from_stack(stack: NetStackType) -> Self {
        match stack {
            NetStackType::Ipv4Only => QueryType::A,
            NetStackType::Ipv6Only => QueryType::AAAA,
            NetStackType::Dual | NetStackType::Unknown => QueryType::Both,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" | "4" => Ok(QueryType::A),
            "AAAA" | "6" => Ok(QueryType::AAAA),
            "BOTH" | "4,6" => Ok(QueryType::Both),
            "AUTO" => Ok(QueryType::Auto),
            other => Err(format!("Unknown query type: {other}")),
        }
    }
}

/// IP-stack capability of the local host.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetStackType {
    #[default]
    Unknown = 0,
    Ipv4Only = 1,
    Ipv6Only = 2,
    Dual = 3,
}

impl NetStackType {
    pub fn from_bits(ipv4: bool, ipv6: bool) -> Self {
        match (ipv4, ipv6) {
            (true, true) => NetStackType::Dual,
            (true, false) => NetStackType::Ipv4Only,
            (false, true) => NetStackType::Ipv6Only,
            (false, false) => NetStackType::Unknown,
        }
    }

    pub fn has_ipv4(&self) -> bool {
        matches!(self, NetStackType::Ipv4Only | NetStackType::Dual)
    }

    pub fn has_ipv6(&self) -> bool {
        matches!(self, NetStackType::Ipv6Only | NetStackType::Dual)
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => NetStackType::Ipv4Only,
            2 => NetStackType::Ipv6Only,
            3 => NetStackType::Dual,
            _ => NetStackType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetStackType::Unknown => "unknown",
            NetStackType::Ipv4Only => "ipv4-only",
            NetStackType::Ipv6Only => "ipv6-only",
            NetStackType::Dual => "dual",
        }
    }
}

impl fmt::Display for NetStackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
