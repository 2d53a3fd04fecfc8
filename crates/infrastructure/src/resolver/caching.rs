use super::dns::DnsServiceResolver;
use crate::dns::RecordLookup;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use ferrous_discovery_application::ports::{ServiceResolution, ServiceResolver};
use ferrous_discovery_domain::{DiscoveryError, ResolverConfig, Service, ServiceQuery};
use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, info};

/// Cache decorator for another service resolver
///
/// Result sets are kept per query for a fixed time after they were loaded.
/// Concurrent misses on one query share a single inner resolution.
#[derive(Default)]
pub struct CachingServiceResolver {
    state: ArcSwapOption<CachingState>,
}

struct CachingState {
    cache: Cache<ServiceQuery, Arc<Vec<Service>>>,
    inner: Arc<dyn ServiceResolver>,
    owns_inner: bool,
}

impl CachingServiceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `inner`, or a DNS resolver built from `config.dns` when `None`.
    pub async fn init(
        &self,
        config: &ResolverConfig,
        inner: Option<Arc<dyn ServiceResolver>>,
    ) -> Result<(), DiscoveryError> {
        self.init_with_lookup(config, inner, None).await
    }

    /// Like [`init`](Self::init); the default DNS resolver, if one is built,
    /// runs on `lookup` instead of the UDP stub.
    pub async fn init_with_lookup(
        &self,
        config: &ResolverConfig,
        inner: Option<Arc<dyn ServiceResolver>>,
        lookup: Option<Arc<dyn RecordLookup>>,
    ) -> Result<(), DiscoveryError> {
        let (inner, owns_inner) = match inner {
            Some(inner) => (inner, false),
            None => {
                let dns = DnsServiceResolver::new();
                match lookup {
                    Some(lookup) => dns.init_with_lookup(&config.dns, lookup).await?,
                    None => dns.init(&config.dns).await?,
                }
                (Arc::new(dns) as Arc<dyn ServiceResolver>, true)
            }
        };

        let cache = Cache::builder()
            .time_to_live(config.cache.ttl())
            .max_capacity(config.cache.max_capacity)
            .build();

        info!(
            inner = inner.kind(),
            owns_inner,
            ttl_ms = config.cache.ttl_ms,
            max_capacity = config.cache.max_capacity,
            "Caching resolver initialized"
        );

        self.state.store(Some(Arc::new(CachingState {
            cache,
            inner,
            owns_inner,
        })));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.load().is_some()
    }

    /// Resolver behind the cache, `None` before init or after close.
    pub fn inner(&self) -> Option<Arc<dyn ServiceResolver>> {
        self.state.load_full().map(|state| Arc::clone(&state.inner))
    }

    /// Drop the cached result set of `query`, if any.
    pub async fn invalidate(&self, query: &ServiceQuery) {
        if let Some(state) = self.state.load_full() {
            state.cache.invalidate(query).await;
        }
    }

    /// Number of cached result sets, zero when not initialized.
    pub async fn entry_count(&self) -> u64 {
        match self.state.load_full() {
            Some(state) => {
                state.cache.run_pending_tasks().await;
                state.cache.entry_count()
            }
            None => 0,
        }
    }
}

#[async_trait]
impl ServiceResolver for CachingServiceResolver {
    async fn resolve(&self, query: &ServiceQuery) -> Result<ServiceResolution, DiscoveryError> {
        let state = self
            .state
            .load_full()
            .ok_or(DiscoveryError::NotInitialized("Caching"))?;

        if let Some(services) = state.cache.get(query).await {
            debug!(name = %query.name, "Cache HIT");
            return Ok(ServiceResolution::cached(services));
        }

        let inner = Arc::clone(&state.inner);
        let key = query.clone();
        let entry = state
            .cache
            .entry(query.clone())
            .or_try_insert_with(async move {
                debug!(name = %key.name, "Cache MISS, loading from inner resolver");
                inner.resolve(&key).await.map(|resolution| resolution.services)
            })
            .await
            .map_err(|e| match e.as_ref() {
                DiscoveryError::ServiceNotFound { .. } => (*e).clone(),
                other => DiscoveryError::Resolution(format!("Failed to load {}: {}", query, other)),
            })?;

        // A waiter that lost the race reads the value its peer loaded.
        let cache_hit = !entry.is_fresh();
        let services = entry.into_value();

        Ok(ServiceResolution {
            services,
            cache_hit,
        })
    }

    fn close(&self) {
        if let Some(state) = self.state.swap(None) {
            state.cache.invalidate_all();
            if state.owns_inner {
                state.inner.close();
            }
            debug!(owns_inner = state.owns_inner, "Caching resolver closed");
        }
    }

    fn kind(&self) -> &'static str {
        "caching"
    }
}
