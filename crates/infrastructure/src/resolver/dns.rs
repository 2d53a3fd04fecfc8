use crate::dns::forwarding::MessageBuilder;
use crate::dns::lookup::system_conf::DEFAULT_DNS_PORT;
use crate::dns::{AnswerRecord, LookupKind, LookupOutcome, RecordLookup, UdpRecordLookup};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use ferrous_discovery_application::ports::{ServiceResolution, ServiceResolver};
use ferrous_discovery_domain::{DiscoveryError, DnsSettings, Service, ServiceQuery};
use futures::future::join_all;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Resolves services through DNS SRV records, chasing every target to its
/// first A record.
///
/// Starts uninitialized; [`init`](Self::init) binds it to a nameserver.
/// When the bound nameserver fails, the resolver walks the system nameserver
/// list and stays bound to whichever one answered last.
#[derive(Default)]
pub struct DnsServiceResolver {
    state: ArcSwapOption<DnsState>,
}

struct DnsState {
    lookup: Arc<dyn RecordLookup>,
    // Only replaced while failing over, with the lock held across the retries.
    nameserver: Mutex<SocketAddr>,
    srv_only: bool,
}

struct SrvTarget {
    port: u16,
    target: Arc<str>,
}

impl DnsServiceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize with the stub UDP lookup built from `settings`.
    pub async fn init(&self, settings: &DnsSettings) -> Result<(), DiscoveryError> {
        let lookup: Arc<dyn RecordLookup> = Arc::new(UdpRecordLookup::from_settings(settings));
        self.init_with_lookup(settings, lookup).await
    }

    /// Initialize on top of a caller supplied record lookup.
    ///
    /// With `settings.host` set the resolver binds to that host (port 53
    /// unless given). Without it the first system nameserver is used and
    /// `settings.port` is ignored.
    pub async fn init_with_lookup(
        &self,
        settings: &DnsSettings,
        lookup: Arc<dyn RecordLookup>,
    ) -> Result<(), DiscoveryError> {
        let nameserver = match settings.host.as_deref() {
            Some(host) => {
                resolve_nameserver(host, settings.port.unwrap_or(DEFAULT_DNS_PORT)).await?
            }
            None => {
                let servers = lookup.system_nameservers()?;
                *servers.first().ok_or_else(|| {
                    DiscoveryError::Resolution("No system nameservers configured".into())
                })?
            }
        };

        info!(
            nameserver = %nameserver,
            srv_only = settings.srv_only,
            "DNS resolver initialized"
        );

        self.state.store(Some(Arc::new(DnsState {
            lookup,
            nameserver: Mutex::new(nameserver),
            srv_only: settings.srv_only,
        })));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.load().is_some()
    }

    /// Nameserver the next lookup goes to, `None` before init or after close.
    pub async fn bound_nameserver(&self) -> Option<SocketAddr> {
        let state = self.state.load_full()?;
        let nameserver = *state.nameserver.lock().await;
        Some(nameserver)
    }

    /// SRV targets of `query` plus the nameserver that answered them.
    async fn lookup_srv(
        state: &DnsState,
        query: &ServiceQuery,
    ) -> Result<(SocketAddr, Vec<SrvTarget>), DiscoveryError> {
        let mut nameserver = *state.nameserver.lock().await;
        let mut outcome = state
            .lookup
            .lookup(nameserver, &query.name, LookupKind::Srv)
            .await?;

        if !outcome.is_successful() {
            warn!(
                name = %query.name,
                nameserver = %nameserver,
                error = %outcome.error_string(),
                "SRV lookup failed, trying other nameservers"
            );
            (nameserver, outcome) = Self::fail_over(state, query, nameserver, outcome).await?;
        }

        let targets = outcome
            .answers
            .into_iter()
            .filter_map(|record| match record {
                AnswerRecord::Srv { port, target, .. } => Some(SrvTarget { port, target }),
                _ => None,
            })
            .collect();
        Ok((nameserver, targets))
    }

    async fn fail_over(
        state: &DnsState,
        query: &ServiceQuery,
        failed: SocketAddr,
        mut last: LookupOutcome,
    ) -> Result<(SocketAddr, LookupOutcome), DiscoveryError> {
        let mut bound = state.nameserver.lock().await;

        let candidates = state.lookup.system_nameservers().unwrap_or_else(|e| {
            warn!(error = %e, "Could not refresh system nameservers");
            Vec::new()
        });

        for candidate in candidates.into_iter().filter(|c| *c != failed) {
            state.lookup.invalidate(&query.name);
            *bound = candidate;
            debug!(name = %query.name, nameserver = %candidate, "Retrying SRV lookup");

            let outcome = state
                .lookup
                .lookup(candidate, &query.name, LookupKind::Srv)
                .await?;
            if outcome.is_successful() {
                info!(name = %query.name, nameserver = %candidate, "Failed over to nameserver");
                return Ok((candidate, outcome));
            }
            last = outcome;
        }

        Err(DiscoveryError::not_found(query, last.error_string()))
    }

    async fn lookup_address(
        state: &DnsState,
        nameserver: SocketAddr,
        query: &ServiceQuery,
        srv: SrvTarget,
    ) -> Option<Service> {
        let outcome = match state.lookup.lookup(nameserver, &srv.target, LookupKind::A).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(target = %srv.target, error = %e, "A lookup failed, dropping record");
                return None;
            }
        };

        let address = outcome.answers.iter().find_map(|record| match record {
            AnswerRecord::A(ip) => Some(*ip),
            _ => None,
        });

        match address {
            Some(ip) => Some(Service::new(
                Arc::clone(&query.name),
                ip.to_string(),
                srv.port,
            )),
            None => {
                debug!(
                    target = %srv.target,
                    status = outcome.status.as_str(),
                    "No A record for SRV target, dropping record"
                );
                None
            }
        }
    }
}

#[async_trait]
impl ServiceResolver for DnsServiceResolver {
    async fn resolve(&self, query: &ServiceQuery) -> Result<ServiceResolution, DiscoveryError> {
        let state = self
            .state
            .load_full()
            .ok_or(DiscoveryError::NotInitialized("DNS"))?;

        MessageBuilder::parse_name(&query.name)?;

        let (nameserver, targets) = Self::lookup_srv(&state, query).await?;

        let services: Vec<Service> = if state.srv_only {
            targets
                .into_iter()
                .map(|srv| Service::new(Arc::clone(&query.name), srv.target, srv.port))
                .collect()
        } else {
            // Same server that answered the SRV query, not the current binding.
            let lookups = targets
                .into_iter()
                .map(|srv| Self::lookup_address(&state, nameserver, query, srv));
            join_all(lookups).await.into_iter().flatten().collect()
        };

        debug!(
            name = %query.name,
            services = services.len(),
            srv_only = state.srv_only,
            "DNS resolution finished"
        );

        Ok(ServiceResolution::new(services))
    }

    fn close(&self) {
        if self.state.swap(None).is_some() {
            debug!("DNS resolver closed");
        }
    }

    fn kind(&self) -> &'static str {
        "dns"
    }
}

async fn resolve_nameserver(host: &str, port: u16) -> Result<SocketAddr, DiscoveryError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| {
            DiscoveryError::Resolution(format!("Could not resolve nameserver {}: {}", host, e))
        })?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| {
            DiscoveryError::Resolution(format!("Nameserver {} has no addresses", host))
        })
}
