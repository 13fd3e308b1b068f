use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// Upper bound for `retry_times`; each retry is a full HTTP round.
pub const MAX_RETRY_TIMES: u32 = 10;

/// HTTPDNS client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Account identifier issued by the HTTPDNS service (required)
    #[serde(default)]
    pub account_id: String,

    /// Secret used to sign requests when `using_sign` is set
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Region sent with schedule requests ("" = global)
    #[serde(default)]
    pub region: String,

    #[serde(default = "default_true")]
    pub using_https: bool,

    #[serde(default = "default_false")]
    pub using_sign: bool,

    #[serde(default = "default_true")]
    pub using_cache: bool,

    /// Per-exchange timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra rounds after the first failed exchange
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,

    /// Well-known boot servers queried for the resolver-server list
    #[serde(default = "default_boot_servers_ipv4")]
    pub boot_servers_ipv4: Vec<String>,

    #[serde(default = "default_boot_servers_ipv6")]
    pub boot_servers_ipv6: Vec<String>,

    /// Validity window added to the signing timestamp, in seconds
    #[serde(default = "default_sign_offset_secs")]
    pub sign_offset_secs: u64,

    /// Domain resolved by the net-stack detector when UDP probes are inconclusive
    #[serde(default = "default_probe_domain")]
    pub probe_domain: String,

    /// Keep the first conclusive net-stack detection result
    #[serde(default = "default_true")]
    pub net_stack_cache: bool,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_sdk_version")]
    pub sdk_version: String,

    /// TTL given to answers produced by the system-resolver fallback
    #[serde(default = "default_local_fallback_ttl")]
    pub local_fallback_ttl: u32,
}

impl ClientConfig {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_id.trim().is_empty() {
            return Err(ConfigError::Validation("client.account_id is required".into()));
        }
        if self.boot_servers_ipv4.is_empty() && self.boot_servers_ipv6.is_empty() {
            return Err(ConfigError::Validation(
                "at least one boot server must be configured".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "client.timeout_ms must be greater than zero".into(),
            ));
        }
        if self.retry_times > MAX_RETRY_TIMES {
            return Err(ConfigError::Validation(format!(
                "client.retry_times cannot exceed {MAX_RETRY_TIMES}"
            )));
        }
        if self.using_sign && self.secret_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Validation(
                "client.using_sign requires client.secret_key".into(),
            ));
        }
        Ok(())
    }

    pub fn scheme(&self) -> &'static str {
        if self.using_https {
            "https"
        } else {
            "http"
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            secret_key: None,
            region: String::new(),
            using_https: true,
            using_sign: false,
            using_cache: true,
            timeout_ms: default_timeout_ms(),
            retry_times: default_retry_times(),
            boot_servers_ipv4: default_boot_servers_ipv4(),
            boot_servers_ipv6: default_boot_servers_ipv6(),
            sign_offset_secs: default_sign_offset_secs(),
            probe_domain: default_probe_domain(),
            net_stack_cache: true,
            platform: default_platform(),
            sdk_version: default_sdk_version(),
            local_fallback_ttl: default_local_fallback_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_timeout_ms() -> u64 {
    2500
}

fn default_retry_times() -> u32 {
    1
}

fn default_boot_servers_ipv4() -> Vec<String> {
    vec![
        "203.107.1.1".to_string(),
        "203.107.1.97".to_string(),
        "203.107.1.100".to_string(),
        "203.119.238.240".to_string(),
        "106.11.25.239".to_string(),
        "59.82.99.47".to_string(),
    ]
}

fn default_boot_servers_ipv6() -> Vec<String> {
    vec![
        "2401:b180:7001::31d".to_string(),
        "2408:4003:1f40::30a".to_string(),
        "2401:b180:2000:20::10".to_string(),
        "2401:b180:2000:30::1c".to_string(),
    ]
}

fn default_sign_offset_secs() -> u64 {
    30 * 60
}

fn default_probe_domain() -> String {
    "www.taobao.com".to_string()
}

fn default_platform() -> String {
    std::env::consts::OS.to_string()
}

fn default_sdk_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_local_fallback_ttl() -> u32 {
    60
}
