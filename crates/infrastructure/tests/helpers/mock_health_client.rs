use async_trait::async_trait;
use ferrous_discovery_domain::DiscoveryError;
use ferrous_discovery_infrastructure::registry::{HealthClient, HealthyInstance};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory registry: instances with their tags, all of them passing.
#[derive(Default)]
pub struct MockHealthClient {
    instances: Mutex<Vec<(HealthyInstance, BTreeSet<String>)>>,
    should_fail: AtomicBool,
    requests: Mutex<Vec<(String, BTreeSet<String>)>>,
}

impl MockHealthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instance(&self, service: &str, address: &str, port: u16, tags: &[&str]) {
        self.instances.lock().unwrap().push((
            HealthyInstance {
                service: service.to_string(),
                node_address: address.to_string(),
                port,
            },
            tags.iter().map(|t| t.to_string()).collect(),
        ));
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<(String, BTreeSet<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthClient for MockHealthClient {
    async fn healthy_instances(
        &self,
        name: &str,
        tags: &BTreeSet<String>,
    ) -> Result<Vec<HealthyInstance>, DiscoveryError> {
        self.requests
            .lock()
            .unwrap()
            .push((name.to_string(), tags.clone()));

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Resolution(
                "Registry returned HTTP 500: Internal Server Error".into(),
            ));
        }

        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|(instance, instance_tags)| {
                instance.service == name && tags.is_subset(instance_tags)
            })
            .map(|(instance, _)| instance.clone())
            .collect())
    }
}
