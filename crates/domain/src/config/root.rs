use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::{ResolverConfig, ResolverKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration, loaded from a TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values passed on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub kind: Option<ResolverKind>,
    pub dns_host: Option<String>,
    pub dns_port: Option<u16>,
    pub srv_only: bool,
    pub registry_host: Option<String>,
    pub registry_port: Option<u16>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from `path` (or defaults when absent) and apply
    /// the CLI overrides on top.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        content.parse()
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(kind) = overrides.kind {
            self.resolver.kind = kind;
        }
        if let Some(host) = overrides.dns_host {
            self.resolver.dns.host = Some(host);
        }
        if let Some(port) = overrides.dns_port {
            self.resolver.dns.port = Some(port);
        }
        if overrides.srv_only {
            self.resolver.dns.srv_only = true;
        }
        if let Some(host) = overrides.registry_host {
            self.resolver.registry.host = host;
        }
        if let Some(port) = overrides.registry_port {
            self.resolver.registry.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LEVELS.join(", ")
            )));
        }
        self.resolver.validate()
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
