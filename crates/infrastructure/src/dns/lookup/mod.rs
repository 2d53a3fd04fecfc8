//! Record lookups against a single nameserver.
//!
//! [`RecordLookup`] is the seam between the DNS resolver and the wire: the
//! resolver decides *which* nameserver to ask and what to do with the answer,
//! the lookup only knows how to ask.

pub mod record_cache;
pub mod system_conf;
pub mod udp_lookup;

pub use record_cache::RecordCache;
pub use udp_lookup::UdpRecordLookup;

use async_trait::async_trait;
use ferrous_discovery_domain::DiscoveryError;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// Record types the resolver ever asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Srv,
    A,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Srv => "SRV",
            Self::A => "A",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result class of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Successful,
    /// Refused, malformed or unsupported by the server
    Unrecoverable,
    /// Server failure or timeout; another server may answer
    TryAgain,
    /// NXDOMAIN
    HostNotFound,
    /// The name exists but has no record of the requested type
    TypeNotFound,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Unrecoverable => "unrecoverable error",
            Self::TryAgain => "try again",
            Self::HostNotFound => "host not found",
            Self::TypeNotFound => "type not found",
        }
    }
}

/// One record of an answer section, reduced to what the resolver reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerRecord {
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: Arc<str>,
    },
    A(Ipv4Addr),
    /// Any other record type that showed up in the answer section
    Other(u16),
}

impl AnswerRecord {
    pub fn srv(port: u16, target: impl Into<Arc<str>>) -> Self {
        Self::Srv {
            priority: 1,
            weight: 1,
            port,
            target: target.into(),
        }
    }

    pub fn kind(&self) -> Option<LookupKind> {
        match self {
            Self::Srv { .. } => Some(LookupKind::Srv),
            Self::A(_) => Some(LookupKind::A),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub status: LookupStatus,
    pub answers: Vec<AnswerRecord>,
    /// Human readable cause for anything but `Successful`
    pub diagnostic: Option<Arc<str>>,
}

impl LookupOutcome {
    pub fn successful(answers: Vec<AnswerRecord>) -> Self {
        Self {
            status: LookupStatus::Successful,
            answers,
            diagnostic: None,
        }
    }

    pub fn failed(status: LookupStatus, diagnostic: impl Into<Arc<str>>) -> Self {
        Self {
            status,
            answers: Vec::new(),
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn try_again(diagnostic: impl Into<Arc<str>>) -> Self {
        Self::failed(LookupStatus::TryAgain, diagnostic)
    }

    pub fn is_successful(&self) -> bool {
        self.status == LookupStatus::Successful
    }

    pub fn error_string(&self) -> String {
        match &self.diagnostic {
            Some(diagnostic) => format!("{} ({})", self.status.as_str(), diagnostic),
            None => self.status.as_str().to_string(),
        }
    }
}

/// Black-box DNS transport used by the DNS resolver.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Ask `nameserver` for records of `kind` at `name`.
    ///
    /// Network trouble is reported through [`LookupStatus`]; `Err` is kept for
    /// problems no other nameserver could fix, such as a malformed name.
    async fn lookup(
        &self,
        nameserver: SocketAddr,
        name: &str,
        kind: LookupKind,
    ) -> Result<LookupOutcome, DiscoveryError>;

    /// Forget any cached answer for `name`.
    fn invalidate(&self, name: &str);

    /// Nameservers configured on this host, in preference order.
    fn system_nameservers(&self) -> Result<Vec<SocketAddr>, DiscoveryError>;
}
