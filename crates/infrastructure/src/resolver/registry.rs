use crate::registry::{HealthClient, HttpHealthClient};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use ferrous_discovery_application::ports::{ServiceResolution, ServiceResolver};
use ferrous_discovery_domain::{DiscoveryError, RegistrySettings, Service, ServiceQuery};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves services from the healthy instances a service registry reports.
#[derive(Default)]
pub struct RegistryServiceResolver {
    client: ArcSwapOption<RegistryState>,
}

struct RegistryState {
    client: Arc<dyn HealthClient>,
}

impl RegistryServiceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize with an HTTP client built from `settings`.
    pub fn init(&self, settings: &RegistrySettings) -> Result<(), DiscoveryError> {
        let client = HttpHealthClient::new(settings)?;
        info!(registry = %client.base_url(), "Registry resolver initialized");
        self.init_with_client(Arc::new(client));
        Ok(())
    }

    pub fn init_with_client(&self, client: Arc<dyn HealthClient>) {
        self.client.store(Some(Arc::new(RegistryState { client })));
    }

    pub fn is_initialized(&self) -> bool {
        self.client.load().is_some()
    }
}

#[async_trait]
impl ServiceResolver for RegistryServiceResolver {
    async fn resolve(&self, query: &ServiceQuery) -> Result<ServiceResolution, DiscoveryError> {
        let state = self
            .client
            .load_full()
            .ok_or(DiscoveryError::NotInitialized("Registry"))?;

        let instances = state
            .client
            .healthy_instances(&query.name, &query.tags)
            .await
            .map_err(|e| match e {
                DiscoveryError::Resolution(_) => e,
                other => DiscoveryError::Resolution(other.to_string()),
            })?;

        if instances.is_empty() {
            return Err(DiscoveryError::not_found(
                query,
                "Registry reported no healthy instances.",
            ));
        }

        let services: Vec<Service> = instances
            .into_iter()
            .map(|instance| Service::new(instance.service, instance.node_address, instance.port))
            .collect();

        debug!(
            name = %query.name,
            tags = query.tags.len(),
            services = services.len(),
            "Registry resolution finished"
        );

        Ok(ServiceResolution::new(services))
    }

    fn close(&self) {
        if self.client.swap(None).is_some() {
            debug!("Registry resolver closed");
        }
    }

    fn kind(&self) -> &'static str {
        "registry"
    }
}
