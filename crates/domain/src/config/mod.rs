//! Configuration module for Ferrous Discovery
//!
//! - `root`: Main configuration and CLI overrides
//! - `resolver`: Resolver variant selection and per-variant settings
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod errors;
pub mod logging;
pub mod resolver;
pub mod root;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use resolver::{CacheSettings, DnsSettings, RegistrySettings, ResolverConfig, ResolverKind};
pub use root::{CliOverrides, Config};
