//! Ferrous Discovery Domain Layer
pub mod config;
pub mod errors;
pub mod service;

pub use config::{
    CacheSettings, CliOverrides, Config, ConfigError, DnsSettings, LoggingConfig,
    RegistrySettings, ResolverConfig, ResolverKind,
};
pub use errors::DiscoveryError;
pub use service::{Service, ServiceQuery};
