//! # HTTPDNS client
//!
//! Resolves host names through an HTTPDNS service from the command line.

mod bootstrap;

use clap::Parser;
use httpdns_application::ports::StackDetector;
use httpdns_domain::{CliOverrides, IpEntry, QueryType, ResolveResult};
use httpdns_infrastructure::HttpDnsClient;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "httpdns")]
#[command(version)]
#[command(about = "Resolve host names through an HTTPDNS service")]
struct Cli {
    /// Hosts to resolve
    #[arg(required_unless_present = "detect_stack")]
    hosts: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// HTTPDNS account id
    #[arg(short, long)]
    account_id: Option<String>,

    /// Secret key; enables signed requests
    #[arg(long)]
    secret_key: Option<String>,

    /// Record type: A, AAAA, BOTH or AUTO
    #[arg(short = 't', long = "type", default_value = "AUTO")]
    query_type: QueryType,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Extra attempts after a failed exchange
    #[arg(long)]
    retry_times: Option<u32>,

    /// Use plain HTTP instead of HTTPS
    #[arg(long)]
    http: bool,

    /// Bypass the answer cache
    #[arg(long)]
    no_cache: bool,

    /// Send hosts in batched requests
    #[arg(short, long)]
    batch: bool,

    /// Fall back to the system resolver when HTTPDNS has no answer
    #[arg(short, long)]
    fallback: bool,

    /// Print the detected IP stack and exit
    #[arg(long)]
    detect_stack: bool,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            account_id: self.account_id.clone(),
            secret_key: self.secret_key.clone(),
            region: None,
            timeout_ms: self.timeout_ms,
            retry_times: self.retry_times,
            using_https: self.http.then_some(false),
            using_cache: self.no_cache.then_some(false),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;
    bootstrap::init_logging(&config);

    let client = HttpDnsClient::new(config.client)?;

    if cli.detect_stack {
        println!("{}", client.detector().stack_type().await);
        return Ok(());
    }

    if let Err(e) = client.bootstrap().await {
        warn!(error = %e, "Bootstrap failed");
    }

    let results = if cli.batch {
        client.resolve_batch(&cli.hosts, cli.query_type).await?
    } else {
        let mut results = Vec::with_capacity(cli.hosts.len());
        for host in &cli.hosts {
            let answer = if cli.fallback {
                client.resolve_with_fallback(host, cli.query_type).await?
            } else {
                client.resolve_host(host, cli.query_type).await?
            };
            match answer {
                Some(result) => results.push(result),
                None => warn!(host = %host, "No answer"),
            }
        }
        results
    };

    for result in &results {
        println!("{}", format_result(result));
    }

    let metrics = client.cache().metrics();
    info!(
        answers = results.len(),
        cache_entries = client.cache().len(),
        cache_hit_rate = metrics.hit_rate(),
        "Done"
    );
    Ok(())
}

fn format_result(result: &ResolveResult) -> String {
    let join = |ips: &[IpEntry]| {
        ips.iter()
            .map(|ip| ip.addr.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    let source = if result.hit_cache { ", cached" } else { "" };
    format!(
        "{} -> {} / {} (ttl={}{})",
        result.host,
        join(&result.ips),
        join(&result.ipsv6),
        result.ttl,
        source
    )
}
