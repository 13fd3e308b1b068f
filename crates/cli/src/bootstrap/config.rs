use httpdns_domain::{CliOverrides, Config};
use tracing::info;

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;

    info!(
        config_file = config_path.unwrap_or("default"),
        account_id = %config.client.account_id,
        boot_servers = config.client.boot_servers_ipv4.len() + config.client.boot_servers_ipv6.len(),
        https = config.client.using_https,
        cache = config.client.using_cache,
        "Configuration loaded"
    );

    Ok(config)
}
