use async_trait::async_trait;
use ferrous_discovery_domain::{DiscoveryError, Service, ServiceQuery};
use std::sync::Arc;

/// Endpoints produced by one resolution.
///
/// The services live behind an `Arc` so a cached result set is handed to
/// every caller without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResolution {
    pub services: Arc<Vec<Service>>,
    pub cache_hit: bool,
}

impl ServiceResolution {
    pub fn new(services: Vec<Service>) -> Self {
        Self {
            services: Arc::new(services),
            cache_hit: false,
        }
    }

    pub fn cached(services: Arc<Vec<Service>>) -> Self {
        Self {
            services,
            cache_hit: true,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Service> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn into_vec(self) -> Vec<Service> {
        Arc::try_unwrap(self.services).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl<'a> IntoIterator for &'a ServiceResolution {
    type Item = &'a Service;
    type IntoIter = std::slice::Iter<'a, Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}

/// Capability shared by every resolver variant.
///
/// `resolve` fails with `DiscoveryError::NotInitialized` when called before
/// the resolver was initialized or after it was closed. `close` is
/// idempotent and must never fail.
#[async_trait]
pub trait ServiceResolver: Send + Sync {
    async fn resolve(&self, query: &ServiceQuery) -> Result<ServiceResolution, DiscoveryError>;

    fn close(&self);

    /// Variant name for logging
    fn kind(&self) -> &'static str;
}
