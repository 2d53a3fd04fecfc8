use async_trait::async_trait;
use ferrous_discovery_domain::{DiscoveryError, RegistrySettings};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One passing instance as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthyInstance {
    pub service: String,
    pub node_address: String,
    pub port: u16,
}

/// Black-box registry client used by the registry resolver.
#[async_trait]
pub trait HealthClient: Send + Sync {
    /// Instances of `name` that pass their health checks and carry every tag
    /// in `tags`.
    async fn healthy_instances(
        &self,
        name: &str,
        tags: &BTreeSet<String>,
    ) -> Result<Vec<HealthyInstance>, DiscoveryError>;
}

/// Health endpoint entry, only the fields the resolver reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    node: NodeEntry,
    service: ServiceDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeEntry {
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceDetails {
    service: String,
    port: u16,
}

/// Client for a Consul compatible `/v1/health/service/{name}` endpoint.
pub struct HttpHealthClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHealthClient {
    pub fn new(settings: &RegistrySettings) -> Result<Self, DiscoveryError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(settings.timeout())
            .pool_max_idle_per_host(4);

        if let Some(ref path) = settings.ca_cert_path {
            let pem = read_pem(path)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                DiscoveryError::Resolution(format!(
                    "Invalid CA bundle {}: {}",
                    path.display(),
                    e
                ))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let Some(ref path) = settings.identity_path {
            let pem = read_pem(path)?;
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                DiscoveryError::Resolution(format!(
                    "Invalid client identity {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.identity(identity);
        }

        if settings.accept_invalid_hostnames {
            builder = builder.danger_accept_invalid_hostnames(true);
        }

        let client = builder.build().map_err(|e| {
            DiscoveryError::Resolution(format!("Could not initialize client: {}", e))
        })?;

        Ok(Self::with_client(client, settings.base_url()))
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health endpoint of `name`; the name is one percent-encoded path segment.
    fn health_url(&self, name: &str) -> Result<Url, DiscoveryError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            DiscoveryError::Resolution(format!("Invalid registry URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DiscoveryError::Resolution(format!(
                    "Registry URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["v1", "health", "service", name]);
        Ok(url)
    }

    fn query_params<'a>(tags: &'a BTreeSet<String>) -> Vec<(&'static str, &'a str)> {
        let mut params = Vec::with_capacity(tags.len() + 1);
        params.push(("passing", "true"));
        params.extend(tags.iter().map(|tag| ("tag", tag.as_str())));
        params
    }
}

#[async_trait]
impl HealthClient for HttpHealthClient {
    async fn healthy_instances(
        &self,
        name: &str,
        tags: &BTreeSet<String>,
    ) -> Result<Vec<HealthyInstance>, DiscoveryError> {
        let url = self.health_url(name)?;
        debug!(url = %url, tags = tags.len(), "Querying registry health endpoint");

        let response = self
            .client
            .get(url.clone())
            .query(&Self::query_params(tags))
            .send()
            .await
            .map_err(|e| {
                DiscoveryError::Resolution(format!("Registry request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Resolution(format!(
                "Registry {} returned HTTP {}: {}",
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            DiscoveryError::Resolution(format!("Failed to read registry response: {}", e))
        })?;

        parse_health_response(&body)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, DiscoveryError> {
    fs::read(path).map_err(|e| {
        DiscoveryError::Resolution(format!("Failed to read {}: {}", path.display(), e))
    })
}

fn parse_health_response(body: &[u8]) -> Result<Vec<HealthyInstance>, DiscoveryError> {
    let entries: Vec<ServiceEntry> = serde_json::from_slice(body).map_err(|e| {
        DiscoveryError::Resolution(format!("Failed to decode registry response: {}", e))
    })?;

    Ok(entries
        .into_iter()
        .map(|entry| HealthyInstance {
            service: entry.service.service,
            node_address: entry.node.address,
            port: entry.service.port,
        })
        .collect())
}
