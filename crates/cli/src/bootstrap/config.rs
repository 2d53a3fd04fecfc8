use ferrous_discovery_domain::{CliOverrides, Config};
use tracing::info;

/// Load and validate the configuration.
///
/// Runs before the subscriber exists, so it reports nothing itself; call
/// [`log_config`] once logging is up.
pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

pub fn log_config(config_path: Option<&str>, config: &Config) {
    info!(
        config_file = config_path.unwrap_or("default"),
        kind = %config.resolver.kind,
        dns_host = config.resolver.dns.host.as_deref().unwrap_or("system"),
        registry = %config.resolver.registry.base_url(),
        "Configuration loaded"
    );
}
