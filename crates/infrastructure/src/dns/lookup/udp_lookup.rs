use super::record_cache::RecordCache;
use super::system_conf;
use super::{LookupKind, LookupOutcome, RecordLookup};
use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use crate::dns::transport::{DnsTransport, TcpTransport, UdpTransport};
use async_trait::async_trait;
use ferrous_discovery_domain::{DiscoveryError, DnsSettings};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Stub lookup over UDP (TCP when the answer is truncated) with a record cache.
pub struct UdpRecordLookup {
    timeout: Duration,
    resolv_conf: PathBuf,
    cache: RecordCache,
}

impl UdpRecordLookup {
    pub fn new(timeout: Duration, resolv_conf: impl Into<PathBuf>) -> Self {
        Self {
            timeout,
            resolv_conf: resolv_conf.into(),
            cache: RecordCache::new(),
        }
    }

    pub fn from_settings(settings: &DnsSettings) -> Self {
        Self::new(settings.timeout(), settings.resolv_conf.clone())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    async fn exchange(
        &self,
        nameserver: SocketAddr,
        name: &str,
        kind: LookupKind,
    ) -> Result<LookupOutcome, DiscoveryError> {
        let (id, query_bytes) = MessageBuilder::build_query(name, kind)?;

        let udp = UdpTransport::new(nameserver);
        let transport_response = match udp.send(&query_bytes, self.timeout).await {
            Ok(response) => response,
            Err(e) => return Ok(LookupOutcome::try_again(e.to_string())),
        };

        let mut response = match ResponseParser::parse(&transport_response.bytes) {
            Ok(response) => response,
            Err(e) => return Ok(LookupOutcome::try_again(e.to_string())),
        };

        if response.truncated {
            debug!(server = %nameserver, name = name, "Response truncated (TC bit), retrying via TCP");
            let tcp = TcpTransport::new(nameserver);
            let retried = match tcp.send(&query_bytes, self.timeout).await {
                Ok(tcp_response) => ResponseParser::parse(&tcp_response.bytes),
                Err(e) => Err(e),
            };
            response = match retried {
                Ok(response) => response,
                Err(e) => return Ok(LookupOutcome::try_again(e.to_string())),
            };
        }

        if response.id != id {
            warn!(
                server = %nameserver,
                expected = id,
                received = response.id,
                "DNS response ID mismatch"
            );
            return Ok(LookupOutcome::try_again("response ID mismatch"));
        }

        let ttl = if response.is_nxdomain() || response.answers.is_empty() {
            response.negative_soa_ttl.unwrap_or(0)
        } else {
            response.min_ttl.unwrap_or(0)
        };
        let outcome = response.into_outcome(kind);
        self.cache.insert(name, kind, &outcome, ttl);

        Ok(outcome)
    }
}

#[async_trait]
impl RecordLookup for UdpRecordLookup {
    async fn lookup(
        &self,
        nameserver: SocketAddr,
        name: &str,
        kind: LookupKind,
    ) -> Result<LookupOutcome, DiscoveryError> {
        if let Some(cached) = self.cache.get(name, kind) {
            debug!(name = name, kind = %kind, "Record cache HIT");
            return Ok(cached);
        }

        let outcome = self.exchange(nameserver, name, kind).await?;

        debug!(
            server = %nameserver,
            name = name,
            kind = %kind,
            status = outcome.status.as_str(),
            answers = outcome.answers.len(),
            "Lookup finished"
        );

        Ok(outcome)
    }

    fn invalidate(&self, name: &str) {
        self.cache.invalidate(name);
    }

    fn system_nameservers(&self) -> Result<Vec<SocketAddr>, DiscoveryError> {
        system_conf::read_nameservers(&self.resolv_conf)
    }
}
