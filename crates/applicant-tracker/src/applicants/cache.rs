//! Cache-aside policy for paginated listings.
//!
//! Pages are cached under a key derived from `(page, limit)` for a fixed TTL.
//! Writes invalidate according to [`InvalidationPolicy`]. With the default
//! `WellKnownPages` policy only page 1 at limits 10 and 20 is dropped, so other
//! pages may serve stale rows until their TTL runs out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::domain::{Applicant, PageRequest};

pub const PAGE_KEY_PREFIX: &str = "applicants_page_";
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(180);

const WELL_KNOWN_PAGES: [(u32, u32); 2] = [(1, 10), (1, 20)];

pub fn page_key(request: PageRequest) -> String {
    format!("{PAGE_KEY_PREFIX}{}_limit_{}", request.page, request.limit)
}

pub fn well_known_keys() -> Vec<String> {
    WELL_KNOWN_PAGES
        .iter()
        .map(|&(page, limit)| page_key(PageRequest::new(page, limit)))
        .collect()
}

/// Key/value backend holding serialized pages.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;
    /// Remove every key matching a glob pattern (only a trailing `*` is required
    /// of implementations). Returns the number of removed keys.
    async fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

/// Which keys a write removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidationPolicy {
    /// Page 1 at limits 10 and 20 only.
    #[default]
    WellKnownPages,
    /// Every key under [`PAGE_KEY_PREFIX`].
    AllPages,
}

impl InvalidationPolicy {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "well-known" | "well_known" | "fixed" => Some(Self::WellKnownPages),
            "all-pages" | "all_pages" | "all" => Some(Self::AllPages),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            InvalidationPolicy::WellKnownPages => "well-known",
            InvalidationPolicy::AllPages => "all-pages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub invalidation: InvalidationPolicy,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_PAGE_TTL,
            invalidation: InvalidationPolicy::default(),
        }
    }
}

/// Outcome of a cache read. Backend failures are folded into `Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Vec<Applicant>),
    Miss,
    Unavailable,
}

/// Wraps a [`PageCache`] with the page encoding and the invalidation policy.
/// Nothing here returns an error: cache failures are logged and swallowed.
pub struct PageCacheAside<C> {
    cache: Arc<C>,
    policy: CachePolicy,
}

impl<C> PageCacheAside<C>
where
    C: PageCache + 'static,
{
    pub fn new(cache: Arc<C>, policy: CachePolicy) -> Self {
        Self { cache, policy }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub async fn lookup(&self, request: PageRequest) -> CacheLookup {
        let key = page_key(request);
        match self.cache.get(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<Applicant>>(&payload) {
                Ok(applicants) => CacheLookup::Hit(applicants),
                Err(err) => {
                    warn!(%key, error = %err, "discarding undecodable cached page");
                    CacheLookup::Miss
                }
            },
            Ok(None) => CacheLookup::Miss,
            Err(err) => {
                warn!(%key, error = %err, "cache read failed, serving from store");
                CacheLookup::Unavailable
            }
        }
    }

    pub async fn store(&self, request: PageRequest, applicants: &[Applicant]) {
        let key = page_key(request);
        let payload = match serde_json::to_string(applicants) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%key, error = %err, "failed to encode page for cache");
                return;
            }
        };

        if let Err(err) = self.cache.set(&key, payload, self.policy.ttl).await {
            warn!(%key, error = %err, "cache write failed");
        }
    }

    pub async fn invalidate(&self) {
        let outcome = match self.policy.invalidation {
            InvalidationPolicy::WellKnownPages => {
                let keys = well_known_keys();
                self.cache.delete(&keys).await.map(|()| keys.len())
            }
            InvalidationPolicy::AllPages => {
                let pattern = format!("{PAGE_KEY_PREFIX}*");
                self.cache.delete_matching(&pattern).await
            }
        };

        match outcome {
            Ok(removed) => debug!(
                policy = self.policy.invalidation.label(),
                removed, "invalidated cached pages"
            ),
            Err(err) => warn!(error = %err, "cache invalidation failed"),
        }
    }
}
