use async_trait::async_trait;
use ferrous_discovery_domain::DiscoveryError;
use ferrous_discovery_infrastructure::dns::{
    AnswerRecord, LookupKind, LookupOutcome, LookupStatus, RecordLookup,
};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::Duration;

type Key = (String, LookupKind);

/// Scripted record lookup
///
/// Answers are registered per name and type, either for one nameserver or
/// for any of them. Anything unregistered is a `HostNotFound`.
#[derive(Default)]
pub struct MockRecordLookup {
    per_server: Mutex<HashMap<(SocketAddr, String, LookupKind), LookupOutcome>>,
    any_server: Mutex<HashMap<Key, LookupOutcome>>,
    errors: Mutex<HashMap<Key, DiscoveryError>>,
    delays: Mutex<HashMap<Key, Duration>>,
    nameservers: Mutex<Vec<SocketAddr>>,
    calls: Mutex<Vec<(SocketAddr, String, LookupKind)>>,
    invalidated: Mutex<Vec<String>>,
}

impl MockRecordLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nameservers(nameservers: Vec<SocketAddr>) -> Self {
        let lookup = Self::default();
        lookup.set_nameservers(nameservers);
        lookup
    }

    pub fn set_nameservers(&self, nameservers: Vec<SocketAddr>) {
        *self.nameservers.lock().unwrap() = nameservers;
    }

    pub fn set(&self, name: &str, kind: LookupKind, outcome: LookupOutcome) {
        self.any_server
            .lock()
            .unwrap()
            .insert((name.to_string(), kind), outcome);
    }

    pub fn set_on(
        &self,
        nameserver: SocketAddr,
        name: &str,
        kind: LookupKind,
        outcome: LookupOutcome,
    ) {
        self.per_server
            .lock()
            .unwrap()
            .insert((nameserver, name.to_string(), kind), outcome);
    }

    pub fn set_error(&self, name: &str, kind: LookupKind, error: DiscoveryError) {
        self.errors
            .lock()
            .unwrap()
            .insert((name.to_string(), kind), error);
    }

    /// Hold every lookup of `name` / `kind` for `delay` before answering
    pub fn set_delay(&self, name: &str, kind: LookupKind, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert((name.to_string(), kind), delay);
    }

    /// SRV answers for `name`, one per `(target, port)`.
    pub fn set_srv(&self, name: &str, targets: &[(&str, u16)]) {
        let answers = targets
            .iter()
            .map(|(target, port)| AnswerRecord::srv(*port, *target))
            .collect();
        self.set(name, LookupKind::Srv, LookupOutcome::successful(answers));
    }

    pub fn set_a(&self, name: &str, addresses: &[Ipv4Addr]) {
        let answers = addresses.iter().map(|ip| AnswerRecord::A(*ip)).collect();
        self.set(name, LookupKind::A, LookupOutcome::successful(answers));
    }

    /// The `namenode.service.lc.` fixture: two SRV targets on port 8020
    /// with one A record each.
    pub fn namenode_fixture() -> Self {
        let lookup = Self::new();
        lookup.set_srv("namenode.service.lc.", &[("node0.lc.", 8020), ("node1.lc.", 8020)]);
        lookup.set_a("node0.lc.", &[Ipv4Addr::new(10, 0, 0, 1)]);
        lookup.set_a("node1.lc.", &[Ipv4Addr::new(10, 0, 0, 2)]);
        lookup
    }

    pub fn calls(&self) -> Vec<(SocketAddr, String, LookupKind)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: LookupKind) -> Vec<(SocketAddr, String)> {
        self.calls()
            .into_iter()
            .filter(|(_, _, k)| *k == kind)
            .map(|(server, name, _)| (server, name))
            .collect()
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordLookup for MockRecordLookup {
    async fn lookup(
        &self,
        nameserver: SocketAddr,
        name: &str,
        kind: LookupKind,
    ) -> Result<LookupOutcome, DiscoveryError> {
        self.calls
            .lock()
            .unwrap()
            .push((nameserver, name.to_string(), kind));

        let key = (name.to_string(), kind);
        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.errors.lock().unwrap().get(&key) {
            return Err(error.clone());
        }

        if let Some(outcome) = self
            .per_server
            .lock()
            .unwrap()
            .get(&(nameserver, name.to_string(), kind))
        {
            return Ok(outcome.clone());
        }

        Ok(self
            .any_server
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| LookupOutcome::failed(LookupStatus::HostNotFound, "NXDOMAIN")))
    }

    fn invalidate(&self, name: &str) {
        self.invalidated.lock().unwrap().push(name.to_string());
    }

    fn system_nameservers(&self) -> Result<Vec<SocketAddr>, DiscoveryError> {
        Ok(self.nameservers.lock().unwrap().clone())
    }
}
