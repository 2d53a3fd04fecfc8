pub mod builder;
pub mod caching;
pub mod dns;
pub mod registry;

pub use builder::ResolverBuilder;
pub use caching::CachingServiceResolver;
pub use dns::DnsServiceResolver;
pub use registry::RegistryServiceResolver;

use async_trait::async_trait;
use ferrous_discovery_application::ports::{ServiceResolution, ServiceResolver};
use ferrous_discovery_domain::{DiscoveryError, ResolverKind, ServiceQuery};

/// The closed set of resolver variants.
///
/// Dispatches by `match` rather than through a trait object, so callers that
/// know the variant can still reach its inherent methods.
pub enum Resolver {
    Dns(DnsServiceResolver),
    Registry(RegistryServiceResolver),
    Caching(CachingServiceResolver),
}

impl Resolver {
    pub fn resolver_kind(&self) -> ResolverKind {
        match self {
            Self::Dns(_) => ResolverKind::Dns,
            Self::Registry(_) => ResolverKind::Registry,
            Self::Caching(_) => ResolverKind::Caching,
        }
    }

    pub fn as_caching(&self) -> Option<&CachingServiceResolver> {
        match self {
            Self::Caching(resolver) => Some(resolver),
            _ => None,
        }
    }
}

#[async_trait]
impl ServiceResolver for Resolver {
    async fn resolve(&self, query: &ServiceQuery) -> Result<ServiceResolution, DiscoveryError> {
        match self {
            Self::Dns(resolver) => resolver.resolve(query).await,
            Self::Registry(resolver) => resolver.resolve(query).await,
            Self::Caching(resolver) => resolver.resolve(query).await,
        }
    }

    fn close(&self) {
        match self {
            Self::Dns(resolver) => resolver.close(),
            Self::Registry(resolver) => resolver.close(),
            Self::Caching(resolver) => resolver.close(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Dns(resolver) => resolver.kind(),
            Self::Registry(resolver) => resolver.kind(),
            Self::Caching(resolver) => resolver.kind(),
        }
    }
}
