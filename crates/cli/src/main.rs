//! # Ferrous Discovery
//!
//! Resolves one logical service to its endpoints and prints them, one
//! `address:port` per line.

mod bootstrap;

use bootstrap::{init_logging, load_config, log_config};
use clap::Parser;
use ferrous_discovery_application::ports::ServiceResolver;
use ferrous_discovery_domain::{
    CliOverrides, DiscoveryError, ResolverConfig, ResolverKind, ServiceQuery,
};
use ferrous_discovery_infrastructure::ResolverBuilder;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ferrous-discovery")]
#[command(version)]
#[command(about = "Resolve a service through DNS SRV records or a service registry")]
struct Cli {
    /// Service name, e.g. namenode.service.lc.
    name: String,

    /// Required tag (repeatable)
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,

    /// Path to configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Resolver variant: dns, registry or caching
    #[arg(short = 'k', long)]
    kind: Option<ResolverKind>,

    /// Nameserver host (system nameservers when absent)
    #[arg(long)]
    dns_host: Option<String>,

    /// Nameserver port
    #[arg(long)]
    dns_port: Option<u16>,

    /// Report SRV targets without resolving their addresses
    #[arg(long)]
    srv_only: bool,

    /// Registry host
    #[arg(long)]
    registry_host: Option<String>,

    /// Registry port
    #[arg(long)]
    registry_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the services as a JSON array
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        kind: cli.kind,
        dns_host: cli.dns_host.clone(),
        dns_port: cli.dns_port,
        srv_only: cli.srv_only,
        registry_host: cli.registry_host.clone(),
        registry_port: cli.registry_port,
        log_level: cli.log_level.clone(),
    };

    let config = match load_config(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return ExitCode::from(1);
        }
    };

    init_logging(&config);
    log_config(cli.config.as_deref(), &config);

    match run(&cli, config.resolver).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Resolution failed");
            eprintln!("{:#}", e);
            match e.downcast_ref::<DiscoveryError>() {
                Some(DiscoveryError::ServiceNotFound { .. }) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

async fn run(cli: &Cli, config: ResolverConfig) -> anyhow::Result<()> {
    let resolver = ResolverBuilder::from_config(config).build().await?;
    let query = ServiceQuery::new(cli.name.as_str(), cli.tags.iter().cloned());

    info!(query = %query, resolver = resolver.kind(), "Resolving");

    let result = resolver.resolve(&query).await;
    resolver.close();
    let resolution = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&*resolution.services)?);
    } else {
        for service in &resolution {
            println!("{}:{}", service.address, service.port);
        }
    }

    info!(query = %query, services = resolution.len(), "Resolved");
    Ok(())
}
