use super::{LookupKind, LookupOutcome, LookupStatus};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest time any answer is kept, whatever its TTL says
const MAX_RECORD_TTL: Duration = Duration::from_secs(3600);

/// Per-lookup answer cache of the stub resolver.
///
/// Positive answers live for the smallest TTL in the answer section, negative
/// ones for the SOA minimum. `TryAgain` and `Unrecoverable` are never stored.
pub struct RecordCache {
    entries: DashMap<(Arc<str>, LookupKind), CachedOutcome>,
}

struct CachedOutcome {
    outcome: LookupOutcome,
    expires_at: Instant,
}

impl RecordCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, name: &str, kind: LookupKind) -> Option<LookupOutcome> {
        let key = (Self::normalize(name), kind);
        let expired = match self.entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.outcome.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&key);
        }
        None
    }

    /// Store `outcome` for `ttl` seconds; a zero TTL stores nothing.
    pub fn insert(&self, name: &str, kind: LookupKind, outcome: &LookupOutcome, ttl: u32) {
        let cacheable = matches!(
            outcome.status,
            LookupStatus::Successful | LookupStatus::HostNotFound | LookupStatus::TypeNotFound
        );
        if !cacheable || ttl == 0 {
            return;
        }

        let ttl = Duration::from_secs(u64::from(ttl)).min(MAX_RECORD_TTL);
        self.entries.insert(
            (Self::normalize(name), kind),
            CachedOutcome {
                outcome: outcome.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn invalidate(&self, name: &str) {
        let name = Self::normalize(name);
        for kind in [LookupKind::Srv, LookupKind::A] {
            self.entries.remove(&(Arc::clone(&name), kind));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn normalize(name: &str) -> Arc<str> {
        Arc::from(name.trim_end_matches('.').to_ascii_lowercase())
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new()
    }
}
