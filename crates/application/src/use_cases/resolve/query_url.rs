use httpdns_domain::{ClientConfig, QueryType, ResolveRequest};
use std::fmt::Write;
use std::net::Ipv6Addr;
use std::time::Duration;
use url::form_urlencoded::byte_serialize;

use crate::ports::RequestSigner;

/// Builds resolve and schedule URLs.
///
/// Query tokens (`4`, `6`, `4,6`) and the comma between batched hosts are
/// written literally; every other value is form-encoded.
pub struct QueryUrlBuilder<'a> {
    signer: &'a dyn RequestSigner,
    platform: &'a str,
    sdk_version: &'a str,
    sign_offset: Duration,
}

impl<'a> QueryUrlBuilder<'a> {
    pub fn new(
        signer: &'a dyn RequestSigner,
        platform: &'a str,
        sdk_version: &'a str,
        sign_offset: Duration,
    ) -> Self {
        Self {
            signer,
            platform,
            sdk_version,
            sign_offset,
        }
    }

    /// `{scheme}://{server}/{account}/{api}?host=..&query=..[&s=&t=][&ip=][&sdns-k=v]&platform=..&sdk_version=..`
    pub fn resolve_url(
        &self,
        request: &ResolveRequest,
        server: &str,
        query_type: QueryType,
        now: u64,
    ) -> String {
        let signing = request.using_sign
            && request
                .secret_key
                .as_deref()
                .is_some_and(|s| !s.is_empty());
        let host_param = request
            .hosts()
            .into_iter()
            .map(encode)
            .collect::<Vec<_>>()
            .join(",");

        let mut url = format!(
            "{}://{}/{}/{}?host={}&query={}",
            scheme(request.using_https),
            format_server(server),
            encode(&request.account_id),
            api_name(request, signing),
            host_param,
            query_type.wire_token()
        );

        if signing {
            if let Some(secret) = request.secret_key.as_deref() {
                let sig = self
                    .signer
                    .sign(&request.host, secret, self.sign_offset, now);
                let _ = write!(url, "&s={}&t={}", encode(&sig.signature), sig.timestamp);
            }
        }
        if let Some(ip) = request.client_ip.as_deref().filter(|ip| !ip.is_empty()) {
            let _ = write!(url, "&ip={}", encode(ip));
        }
        for (key, value) in &request.sdns_params {
            let _ = write!(url, "&sdns-{}={}", encode(key), encode(value));
        }
        let _ = write!(
            url,
            "&platform={}&sdk_version={}",
            encode(self.platform),
            encode(self.sdk_version)
        );
        url
    }

    /// `{scheme}://{boot}/{account}/ss?platform=..&sdkVersion=..&region=..[&s=&t=&n=]`
    pub fn schedule_url(&self, config: &ClientConfig, boot: &str, now: u64, nonce: &str) -> String {
        let mut url = format!(
            "{}://{}/{}/ss?platform={}&sdkVersion={}&region={}",
            config.scheme(),
            format_server(boot),
            encode(&config.account_id),
            encode(self.platform),
            encode(self.sdk_version),
            encode(&config.region)
        );
        if config.using_sign {
            if let Some(secret) = config.secret_key.as_deref().filter(|s| !s.is_empty()) {
                let subject = format!("{}-{}", config.account_id, nonce);
                let sig = self.signer.sign(&subject, secret, self.sign_offset, now);
                let _ = write!(
                    url,
                    "&s={}&t={}&n={}",
                    encode(&sig.signature),
                    sig.timestamp,
                    encode(nonce)
                );
            }
        }
        url
    }
}

/// Bracket IPv6 literals so they can sit in the authority part of a URL.
pub fn format_server(server: &str) -> String {
    if server.parse::<Ipv6Addr>().is_ok() {
        format!("[{server}]")
    } else {
        server.to_string()
    }
}

fn api_name(request: &ResolveRequest, signing: bool) -> &'static str {
    match (
        !request.sdns_params.is_empty(),
        request.using_multi,
        signing,
    ) {
        (true, _, false) => "sdns",
        (true, _, true) => "sign_sdns",
        (false, true, false) => "resolve",
        (false, true, true) => "sign_resolve",
        (false, false, false) => "d",
        (false, false, true) => "sign_d",
    }
}

fn scheme(using_https: bool) -> &'static str {
    if using_https {
        "https"
    } else {
        "http"
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}
