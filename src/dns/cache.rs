//! Host resolution cache
//!
//! Maps a requested hostname to the go-import directives published in its
//! TXT records. Entries live for the configured refresh period; lookups that
//! fail or find nothing usable are never stored, so the next request for that
//! host goes back to DNS.

use super::{parse_import, ImportDirective, TxtAnswer, TxtExchange};
use lru::LruCache;
use parking_lot::RwLock;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

/// Upper bound on the refresh period, keeps `Instant` arithmetic in range
const MAX_REFRESH: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Why a host could not be resolved
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// Transport or resolver failure (timeout, refused, bad response)
    #[error("lookup {host:?}: {cause}")]
    Dns { host: String, cause: String },

    /// The exchange succeeded but carried no valid go-import record
    #[error("lookup {host:?}: no go-import TXT records found")]
    NotFound { host: String },
}

impl LookupError {
    pub fn dns(host: &str, cause: impl fmt::Display) -> Self {
        LookupError::Dns {
            host: host.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn not_found(host: &str) -> Self {
        LookupError::NotFound {
            host: host.to_string(),
        }
    }

    /// Short failure kind for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Dns { .. } => "dns",
            LookupError::NotFound { .. } => "not_found",
        }
    }

    pub fn host(&self) -> &str {
        match self {
            LookupError::Dns { host, .. } | LookupError::NotFound { host } => host,
        }
    }
}

/// A successful resolution: never empty, replaced wholesale on refresh
#[derive(Debug)]
pub struct ResolvedHost {
    imports: Vec<ImportDirective>,
    expiry: Instant,
}

impl ResolvedHost {
    /// Directives in DNS answer order
    pub fn imports(&self) -> &[ImportDirective] {
        &self.imports
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    /// Fresh while the expiry is strictly after `now`
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.expiry > now
    }
}

/// TTL-bounded hostname → [`ResolvedHost`] cache in front of a [`TxtExchange`]
///
/// One reader/writer lock guards the whole map. It is only ever held for a
/// map read or a single insert; DNS I/O and parsing happen outside it.
pub struct HostCache {
    exchange: Arc<dyn TxtExchange>,
    refresh: Duration,
    timeout: Duration,
    hosts: RwLock<LruCache<String, Arc<ResolvedHost>>>,
}

impl HostCache {
    /// Create a cache holding at most `capacity` hosts
    pub fn new(
        exchange: Arc<dyn TxtExchange>,
        refresh: Duration,
        capacity: usize,
        timeout: Duration,
    ) -> Self {
        HostCache {
            exchange,
            refresh: refresh.min(MAX_REFRESH),
            timeout,
            hosts: RwLock::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Resolve `host` to its go-import directives
    ///
    /// Served from the cache while fresh, otherwise looked up via DNS.
    /// Dropping the returned future abandons any in-flight exchange.
    pub async fn resolve(&self, host: &str) -> Result<Arc<ResolvedHost>, LookupError> {
        let host = normalize_host(host);
        if host.is_empty() {
            return Err(LookupError::not_found(&host));
        }

        if let Some(hit) = self.fresh(&host) {
            debug!("go-import {} (cache)", host);
            return Ok(hit);
        }

        self.lookup(&host).await
    }

    /// Fast path: never blocks on I/O
    fn fresh(&self, host: &str) -> Option<Arc<ResolvedHost>> {
        let hosts = self.hosts.read();
        hosts
            .peek(host)
            .filter(|resolved| resolved.is_fresh(Instant::now()))
            .cloned()
    }

    async fn lookup(&self, host: &str) -> Result<Arc<ResolvedHost>, LookupError> {
        let answers = match tokio::time::timeout(self.timeout, self.exchange.exchange(host)).await
        {
            Ok(answers) => answers?,
            Err(_) => return Err(LookupError::dns(host, "timed out")),
        };

        let imports = collect_imports(&answers);
        if imports.is_empty() {
            return Err(LookupError::not_found(host));
        }

        let resolved = Arc::new(ResolvedHost {
            imports,
            expiry: Instant::now() + self.refresh,
        });
        self.hosts
            .write()
            .put(host.to_string(), Arc::clone(&resolved));

        info!(
            "go-import {} -> {} directives, next refresh in {:?}",
            host,
            resolved.imports.len(),
            self.refresh
        );
        Ok(resolved)
    }

    /// Whether an entry (fresh or stale) is stored for `host`
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.read().contains(&normalize_host(host))
    }

    pub fn len(&self) -> usize {
        self.hosts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.read().is_empty()
    }

    pub fn clear(&self) {
        self.hosts.write().clear();
        info!("go-import cache cleared");
    }

    pub fn refresh_period(&self) -> Duration {
        self.refresh
    }
}

/// Every valid directive across all TXT answers, in answer then string order
fn collect_imports(answers: &[TxtAnswer]) -> Vec<ImportDirective> {
    answers
        .iter()
        .filter_map(|answer| match answer {
            TxtAnswer::Txt(strings) => Some(strings),
            TxtAnswer::Other(_) => None,
        })
        .flatten()
        .filter_map(|s| parse_import(s))
        .collect()
}

/// Cache keys and queries are case-insensitive and never end in a dot
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}
