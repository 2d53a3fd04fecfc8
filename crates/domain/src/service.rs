use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A resolved endpoint of a logical service.
///
/// Only ever produced by a resolver. Uses `Arc<str>` so result sets can be
/// shared between the cache and every caller without copying strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Service {
    pub name: Arc<str>,
    pub address: Arc<str>,
    pub port: u16,
}

impl Service {
    pub fn new(name: impl Into<Arc<str>>, address: impl Into<Arc<str>>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.address, self.port)
    }
}

/// Logical service name plus an optional set of tags.
///
/// Doubles as the cache key of the caching resolver. Tags live in a
/// `BTreeSet`, so two queries built from the same tags in a different order
/// compare and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceQuery {
    pub name: Arc<str>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl ServiceQuery {
    pub fn new<I, T>(name: impl Into<Arc<str>>, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Query without tags.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

impl fmt::Display for ServiceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceQuery(name={}", self.name)?;
        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            write!(f, ", tags=[{}]", tags.join(", "))?;
        }
        f.write_str(")")
    }
}
