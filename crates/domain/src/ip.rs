use std::cmp::Ordering;
use std::fmt;

/// Resolver server or answer address with its observed round-trip time.
///
/// `rtt_ms = None` means no sample has been folded in yet. Because `None`
/// orders before every `Some`, unmeasured entries win a min-RTT selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpEntry {
    pub addr: String,
    pub rtt_ms: Option<u32>,
}

impl IpEntry {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            rtt_ms: None,
        }
    }

    pub fn with_rtt(addr: impl Into<String>, rtt_ms: u32) -> Self {
        Self {
            addr: addr.into(),
            rtt_ms: Some(rtt_ms),
        }
    }

    /// Order by round-trip time, unset first.
    #[inline]
    pub fn cmp_rtt(&self, other: &Self) -> Ordering {
        self.rtt_ms.cmp(&other.rtt_ms)
    }

    /// True when the address is an IPv6 literal.
    pub fn is_ipv6(&self) -> bool {
        self.addr.contains(':')
    }
}

impl fmt::Display for IpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rtt_ms {
            Some(rtt) => write!(f, "{} ({}ms)", self.addr, rtt),
            None => write!(f, "{} (unmeasured)", self.addr),
        }
    }
}

/// Ordered-sequence operations shared by server lists and answer lists.
pub trait IpList {
    fn find(&self, addr: &str) -> Option<&IpEntry>;
    fn find_mut(&mut self, addr: &str) -> Option<&mut IpEntry>;
    fn contains_addr(&self, addr: &str) -> bool;
    fn min_rtt(&self) -> Option<&IpEntry>;
    fn sort_by_rtt(&mut self);
    fn rotate_one(&mut self);
    /// Append every address not yet present with an unset RTT.
    /// Returns how many were added.
    fn merge_addrs<'a, I>(&mut self, addrs: I) -> usize
    where
        I: IntoIterator<Item = &'a str>;
    fn addrs(&self) -> Vec<&str>;
}

impl IpList for Vec<IpEntry> {
    fn find(&self, addr: &str) -> Option<&IpEntry> {
        self.iter().find(|ip| ip.addr == addr)
    }

    fn find_mut(&mut self, addr: &str) -> Option<&mut IpEntry> {
        self.iter_mut().find(|ip| ip.addr == addr)
    }

    fn contains_addr(&self, addr: &str) -> bool {
        self.find(addr).is_some()
    }

    fn min_rtt(&self) -> Option<&IpEntry> {
        self.iter().min_by(|a, b| a.cmp_rtt(b))
    }

    fn sort_by_rtt(&mut self) {
        self.sort_by(IpEntry::cmp_rtt);
    }

    fn rotate_one(&mut self) {
        if self.len() > 1 {
            self.rotate_left(1);
        }
    }

    fn merge_addrs<'a, I>(&mut self, addrs: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for addr in addrs {
            if addr.is_empty() || self.contains_addr(addr) {
                continue;
            }
            self.push(IpEntry::new(addr));
            added += 1;
        }
        added
    }

    fn addrs(&self) -> Vec<&str> {
        self.iter().map(|ip| ip.addr.as_str()).collect()
    }
}

/// Build an answer list from plain address strings, skipping duplicates.
pub fn ip_list_from<'a, I>(addrs: I) -> Vec<IpEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut list = Vec::new();
    list.merge_addrs(addrs);
    list
}
