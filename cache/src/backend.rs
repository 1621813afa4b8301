//! The uniform `CacheBackend` contract (§4.4) every storage implementation
//! satisfies, plus the small value types shared across backends.

use std::time::Duration;

use camino::Utf8Path;
use chrono::{DateTime, Utc};

use crate::error::CacheResult;

/// Per-instance configuration. One backend instance serves exactly one
/// `cache_type` namespace (§4.4 Namespacing).
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub cache_type: String,
    /// `None` = immortal.
    pub ttl: Option<Duration>,
    /// `None` = never compress; `Some(0)` = always; `Some(n)` = if payload
    /// size in bytes is at least `n`.
    pub compress_threshold: Option<u64>,
}

impl CacheConfig {
    pub fn new(cache_type: impl Into<String>) -> Self {
        Self { cache_type: cache_type.into(), ttl: None, compress_threshold: None }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_compress_threshold(mut self, threshold: u64) -> Self {
        self.compress_threshold = Some(threshold);
        self
    }
}

/// Metadata returned alongside a key by [`CacheBackend::each`].
#[derive(Clone, Debug, PartialEq)]
pub struct EntryMeta {
    pub created_at: DateTime<Utc>,
    pub size: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl EntryMeta {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// An exclusive, key-scoped lock. Releases when dropped. Reentrancy is not
/// guaranteed: acquiring the same key twice from the same caller may block
/// or panic depending on the backend.
pub trait CacheLockGuard: Send {}

/// Storage-agnostic contract satisfied by the filesystem, key-value, and
/// object-store backends (§4.4). Kept object-safe (no generic methods) so a
/// composition root can hold `Box<dyn CacheBackend>` per cache type.
pub trait CacheBackend: Send + Sync {
    fn exist(&self, key: &str) -> CacheResult<bool>;

    fn read(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Copies the cached payload to `dest`. Returns `false` without touching
    /// `dest` if the entry is absent or expired.
    fn write_to(&self, key: &str, dest: &Utf8Path) -> CacheResult<bool>;

    /// Copies the bytes at `source_path` into the cache under `key`,
    /// recording creation time and, if a TTL is configured, expiration.
    fn store(&self, key: &str, source_path: &Utf8Path) -> CacheResult<()>;

    fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Removes every entry in this backend's own namespace.
    fn clear(&self) -> CacheResult<()>;

    fn age(&self, key: &str) -> CacheResult<Option<Duration>>;

    fn expired(&self, key: &str) -> CacheResult<bool>;

    fn size(&self, key: &str) -> CacheResult<Option<u64>>;

    /// Acquires an exclusive lock scoped to `key`. The caller runs its
    /// critical section and drops the returned guard to release.
    fn lock(&self, key: &str) -> CacheResult<Box<dyn CacheLockGuard>>;

    /// Enumerates every entry. Materialized eagerly (a snapshot) rather than
    /// as a lazy external iterator, so the trait stays object-safe; callers
    /// needing a live view should re-enumerate.
    fn each(&self) -> CacheResult<Vec<(String, EntryMeta)>>;
}
