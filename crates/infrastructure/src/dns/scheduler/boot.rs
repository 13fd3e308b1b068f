use httpdns_domain::{ClientConfig, NetStackType, ScheduleAnswer};

/// Well-known servers that answer schedule requests.
///
/// Grows as schedule answers come in, so later bootstraps can reach servers
/// learned earlier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootServers {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

impl BootServers {
    pub fn new(ipv4: Vec<String>, ipv6: Vec<String>) -> Self {
        Self { ipv4, ipv6 }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.boot_servers_ipv4.clone(),
            config.boot_servers_ipv6.clone(),
        )
    }

    /// IPv6 list on IPv6-only hosts, IPv4 list otherwise.
    pub fn candidates(&self, stack: NetStackType) -> &[String] {
        if stack == NetStackType::Ipv6Only {
            &self.ipv6
        } else {
            &self.ipv4
        }
    }

    /// Append every server of `answer` not yet known.
    pub fn merge(&mut self, answer: &ScheduleAnswer) -> usize {
        append_unique(&mut self.ipv4, &answer.ipv4) + append_unique(&mut self.ipv6, &answer.ipv6)
    }

    /// Append every server of `other` not yet known.
    pub fn absorb(&mut self, other: &BootServers) -> usize {
        append_unique(&mut self.ipv4, &other.ipv4) + append_unique(&mut self.ipv6, &other.ipv6)
    }
}

fn append_unique(list: &mut Vec<String>, addrs: &[String]) -> usize {
    let before = list.len();
    for addr in addrs {
        if !addr.is_empty() && !list.contains(addr) {
            list.push(addr.clone());
        }
    }
    list.len() - before
}
