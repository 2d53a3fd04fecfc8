use crate::config::ConfigError;
use crate::service::ServiceQuery;
use thiserror::Error;

/// Errors surfaced by every resolver variant.
///
/// `Clone` so a single failed load in the caching layer can be handed to
/// every caller that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// The service has no currently resolvable instances.
    #[error("Error: {reason} Could not find service {query}")]
    ServiceNotFound { query: ServiceQuery, reason: String },

    #[error("Service resolution failed: {0}")]
    Resolution(String),

    #[error("{0} resolver has not been initialized")]
    NotInitialized(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DiscoveryError {
    pub fn not_found(query: &ServiceQuery, reason: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            query: query.clone(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }
}
