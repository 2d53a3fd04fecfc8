use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Resolver variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// SRV + A record chasing against a DNS nameserver
    #[default]
    Dns,
    /// Healthy-instance query against an HTTP service registry
    #[serde(alias = "http")]
    Registry,
    /// Time-bounded memoization in front of another resolver
    #[serde(alias = "cache")]
    Caching,
}

impl ResolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Registry => "registry",
            Self::Caching => "caching",
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolverKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dns" => Ok(Self::Dns),
            "registry" | "http" => Ok(Self::Registry),
            "caching" | "cache" => Ok(Self::Caching),
            other => Err(ConfigError::UnknownResolverKind(other.to_string())),
        }
    }
}

/// DNS resolver settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsSettings {
    /// Nameserver host. `None` means "use the system configured nameservers"
    #[serde(default)]
    pub host: Option<String>,

    /// Nameserver port (default: 53 when a host is given)
    #[serde(default)]
    pub port: Option<u16>,

    /// Per-lookup timeout in milliseconds
    #[serde(default = "default_lookup_timeout")]
    pub timeout_ms: u64,

    /// Return SRV targets as addresses without resolving their A records
    #[serde(default)]
    pub srv_only: bool,

    /// Where the system nameserver list is read from
    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: PathBuf,
}

impl DnsSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            timeout_ms: default_lookup_timeout(),
            srv_only: false,
            resolv_conf: default_resolv_conf(),
        }
    }
}

/// Registry (HTTP health API) settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrySettings {
    #[serde(default = "default_registry_host")]
    pub host: String,

    #[serde(default = "default_registry_port")]
    pub port: u16,

    #[serde(default)]
    pub https: bool,

    /// PEM bundle of extra trusted CA certificates
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,

    /// PEM file holding a client certificate chain and its private key
    #[serde(default)]
    pub identity_path: Option<PathBuf>,

    /// Skip hostname verification of the registry certificate
    #[serde(default)]
    pub accept_invalid_hostnames: bool,

    /// Request timeout in milliseconds
    #[serde(default = "default_registry_timeout")]
    pub timeout_ms: u64,
}

impl RegistrySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            host: default_registry_host(),
            port: default_registry_port(),
            https: false,
            ca_cert_path: None,
            identity_path: None,
            accept_invalid_hostnames: false,
            timeout_ms: default_registry_timeout(),
        }
    }
}

/// Caching resolver settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Expiration after write, in milliseconds (default: 1 minute)
    #[serde(default = "default_cache_ttl")]
    pub ttl_ms: u64,

    /// Upper bound on cached queries; entries past it are evicted before
    /// their TTL elapses
    #[serde(default = "default_cache_max_capacity")]
    pub max_capacity: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl(),
            max_capacity: default_cache_max_capacity(),
        }
    }
}

/// Everything needed to build one resolver
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub kind: ResolverKind,

    #[serde(default)]
    pub dns: DnsSettings,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl ResolverConfig {
    pub fn new(kind: ResolverKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Checks the fields the selected variant depends on.
    ///
    /// The caching variant also checks the DNS settings since it may fall
    /// back to building a DNS resolver.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            ResolverKind::Dns => self.validate_dns(),
            ResolverKind::Registry => self.validate_registry(),
            ResolverKind::Caching => {
                self.validate_dns()?;
                self.validate_cache()
            }
        }
    }

    fn validate_dns(&self) -> Result<(), ConfigError> {
        if self.dns.port == Some(0) {
            return Err(ConfigError::Validation("dns.port must be in 1-65535".into()));
        }
        if matches!(self.dns.host.as_deref(), Some(h) if h.trim().is_empty()) {
            return Err(ConfigError::Validation("dns.host must not be empty".into()));
        }
        if self.dns.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dns.timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn validate_registry(&self) -> Result<(), ConfigError> {
        if self.registry.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "registry.host must not be empty".into(),
            ));
        }
        if self.registry.port == 0 {
            return Err(ConfigError::Validation(
                "registry.port must be in 1-65535".into(),
            ));
        }
        Ok(())
    }

    fn validate_cache(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_ms == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_ms must be greater than 0".into(),
            ));
        }
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.max_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_lookup_timeout() -> u64 {
    2000
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from("/etc/resolv.conf")
}

fn default_registry_host() -> String {
    "localhost".to_string()
}

fn default_registry_port() -> u16 {
    8500
}

fn default_registry_timeout() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    60_000
}

fn default_cache_max_capacity() -> u64 {
    10_000
}
