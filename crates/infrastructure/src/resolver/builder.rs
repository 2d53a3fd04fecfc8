use super::{CachingServiceResolver, DnsServiceResolver, RegistryServiceResolver, Resolver};
use crate::dns::RecordLookup;
use crate::registry::HealthClient;
use ferrous_discovery_application::ports::ServiceResolver;
use ferrous_discovery_domain::{DiscoveryError, ResolverConfig, ResolverKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds and initializes one [`Resolver`] from a [`ResolverConfig`].
///
/// Pre-built handles (health client, inner resolver, record lookup) take
/// precedence over what the config would construct.
pub struct ResolverBuilder {
    config: ResolverConfig,
    health_client: Option<Arc<dyn HealthClient>>,
    inner: Option<Arc<dyn ServiceResolver>>,
    record_lookup: Option<Arc<dyn RecordLookup>>,
}

impl ResolverBuilder {
    pub fn new(kind: ResolverKind) -> Self {
        Self::from_config(ResolverConfig::new(kind))
    }

    pub fn from_config(config: ResolverConfig) -> Self {
        Self {
            config,
            health_client: None,
            inner: None,
            record_lookup: None,
        }
    }

    pub fn with_dns_host(mut self, host: impl Into<String>) -> Self {
        self.config.dns.host = Some(host.into());
        self
    }

    pub fn with_dns_port(mut self, port: u16) -> Self {
        self.config.dns.port = Some(port);
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.config.dns.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_srv_only(mut self, srv_only: bool) -> Self {
        self.config.dns.srv_only = srv_only;
        self
    }

    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dns.resolv_conf = path.into();
        self
    }

    pub fn with_registry_host(mut self, host: impl Into<String>) -> Self {
        self.config.registry.host = host.into();
        self
    }

    pub fn with_registry_port(mut self, port: u16) -> Self {
        self.config.registry.port = port;
        self
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.config.registry.https = https;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_cache_capacity(mut self, max_capacity: u64) -> Self {
        self.config.cache.max_capacity = max_capacity;
        self
    }

    pub fn with_health_client(mut self, client: Arc<dyn HealthClient>) -> Self {
        self.health_client = Some(client);
        self
    }

    /// Resolver the caching variant delegates to instead of its own DNS one
    pub fn with_inner_resolver(mut self, inner: Arc<dyn ServiceResolver>) -> Self {
        self.inner = Some(inner);
        self
    }

    pub fn with_record_lookup(mut self, lookup: Arc<dyn RecordLookup>) -> Self {
        self.record_lookup = Some(lookup);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub async fn build(self) -> Result<Resolver, DiscoveryError> {
        self.config.validate()?;

        info!(
            kind = %self.config.kind,
            dns_host = self.config.dns.host.as_deref().unwrap_or("system"),
            srv_only = self.config.dns.srv_only,
            custom_inner = self.inner.is_some(),
            "Building service resolver"
        );

        match self.config.kind {
            ResolverKind::Dns => {
                let resolver = DnsServiceResolver::new();
                match self.record_lookup {
                    Some(lookup) => resolver.init_with_lookup(&self.config.dns, lookup).await?,
                    None => resolver.init(&self.config.dns).await?,
                }
                Ok(Resolver::Dns(resolver))
            }
            ResolverKind::Registry => {
                let resolver = RegistryServiceResolver::new();
                match self.health_client {
                    Some(client) => resolver.init_with_client(client),
                    None => resolver.init(&self.config.registry)?,
                }
                Ok(Resolver::Registry(resolver))
            }
            ResolverKind::Caching => {
                let resolver = CachingServiceResolver::new();
                resolver
                    .init_with_lookup(&self.config, self.inner, self.record_lookup)
                    .await?;
                Ok(Resolver::Caching(resolver))
            }
        }
    }
}
