//! The remote object-store `CacheBackend` (§4.4), built on a small
//! first-party [`ObjectClient`] trait rather than a concrete S3 client (see
//! DESIGN.md). TTL and the logical key are carried as object metadata
//! (`expires-at`, `logical-key`) since object stores generally expose a
//! metadata side-channel rather than a typed value.

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use camino::Utf8Path;
use chrono::{DateTime, Utc};

use crate::{
    backend::{CacheBackend, CacheConfig, CacheLockGuard, EntryMeta},
    compression,
    error::{CacheError, CacheResult},
    key::CacheDigest,
};

const EXPIRES_AT_KEY: &str = "expires-at";
const LOGICAL_KEY: &str = "logical-key";
const COMPRESSED_KEY: &str = "compressed";
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);
const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

pub trait ObjectClient: Send + Sync {
    fn get(&self, path: &str) -> CacheResult<Option<Vec<u8>>>;
    fn metadata(&self, path: &str) -> CacheResult<Option<HashMap<String, String>>>;
    fn put(&self, path: &str, bytes: Vec<u8>, metadata: HashMap<String, String>) -> CacheResult<()>;
    /// Conditional put used for lock acquisition: succeeds only if absent.
    fn put_if_absent(&self, path: &str, bytes: Vec<u8>, metadata: HashMap<String, String>) -> CacheResult<bool>;
    fn delete(&self, path: &str) -> CacheResult<bool>;
    fn list_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>>;
}

pub struct ObjectCacheBackend {
    client: Arc<dyn ObjectClient>,
    config: CacheConfig,
    lock_timeout: Duration,
}

impl ObjectCacheBackend {
    pub fn new(client: Arc<dyn ObjectClient>, config: CacheConfig) -> Self {
        Self { client, config, lock_timeout: Duration::from_secs(30) }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    fn object_path(&self, key: &str) -> String {
        format!("cache/{}/{}", self.config.cache_type, CacheDigest::of(key).as_hex())
    }

    fn lock_path(&self, key: &str) -> String {
        format!("{}.lock", self.object_path(key))
    }

    fn meta_expiry(metadata: &HashMap<String, String>) -> Option<DateTime<Utc>> {
        metadata.get(EXPIRES_AT_KEY).and_then(|raw| raw.parse().ok())
    }
}

impl CacheBackend for ObjectCacheBackend {
    fn exist(&self, key: &str) -> CacheResult<bool> {
        match self.client.metadata(&self.object_path(key))? {
            Some(metadata) => Ok(match Self::meta_expiry(&metadata) {
                Some(deadline) => Utc::now() < deadline,
                None => true,
            }),
            None => Ok(false),
        }
    }

    fn read(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if !self.exist(key)? {
            return Ok(None);
        }
        Ok(self.client.get(&self.object_path(key))?.map(compression::maybe_decompress).transpose()?)
    }

    fn write_to(&self, key: &str, dest: &Utf8Path) -> CacheResult<bool> {
        match self.read(key)? {
            Some(bytes) => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(dest, bytes)?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn store(&self, key: &str, source_path: &Utf8Path) -> CacheResult<()> {
        let raw = std::fs::read(source_path)?;
        let compressed = compression::should_compress(self.config.compress_threshold, raw.len());
        let payload = if compressed { compression::compress(&raw)? } else { raw };

        let mut metadata = HashMap::new();
        metadata.insert(LOGICAL_KEY.to_string(), key.to_string());
        metadata.insert(COMPRESSED_KEY.to_string(), compressed.to_string());
        if let Some(ttl) = self.config.ttl {
            if let Ok(duration) = chrono::Duration::from_std(ttl) {
                if let Some(deadline) = Utc::now().checked_add_signed(duration) {
                    metadata.insert(EXPIRES_AT_KEY.to_string(), deadline.to_rfc3339());
                }
            }
        }

        self.client.put(&self.object_path(key), payload, metadata)
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        self.client.delete(&self.object_path(key))
    }

    fn clear(&self) -> CacheResult<()> {
        let prefix = format!("cache/{}/", self.config.cache_type);
        for path in self.client.list_with_prefix(&prefix)? {
            self.client.delete(&path)?;
        }
        Ok(())
    }

    fn age(&self, key: &str) -> CacheResult<Option<Duration>> {
        let Some(metadata) = self.client.metadata(&self.object_path(key))? else {
            return Ok(None);
        };
        let Some(deadline) = Self::meta_expiry(&metadata) else {
            return Ok(None);
        };
        let Some(ttl) = self.config.ttl else {
            return Ok(None);
        };
        let created_at = deadline - chrono::Duration::from_std(ttl).unwrap_or_default();
        Ok((Utc::now() - created_at).to_std().ok())
    }

    fn expired(&self, key: &str) -> CacheResult<bool> {
        match self.client.metadata(&self.object_path(key))? {
            Some(metadata) => Ok(Self::meta_expiry(&metadata).is_some_and(|deadline| Utc::now() >= deadline)),
            None => Ok(true),
        }
    }

    fn size(&self, key: &str) -> CacheResult<Option<u64>> {
        Ok(self.client.get(&self.object_path(key))?.map(|bytes| bytes.len() as u64))
    }

    fn lock(&self, key: &str) -> CacheResult<Box<dyn CacheLockGuard>> {
        let lock_path = self.lock_path(key);
        let started = std::time::Instant::now();

        loop {
            let deadline = Utc::now() + chrono::Duration::from_std(DEFAULT_LOCK_TTL).unwrap();
            let mut metadata = HashMap::new();
            metadata.insert(EXPIRES_AT_KEY.to_string(), deadline.to_rfc3339());

            if self.client.put_if_absent(&lock_path, Vec::new(), metadata)? {
                return Ok(Box::new(ObjectLockGuard { client: self.client.clone(), path: lock_path }));
            }

            if let Some(existing) = self.client.metadata(&lock_path)? {
                if Self::meta_expiry(&existing).is_some_and(|d| Utc::now() >= d) {
                    let _ = self.client.delete(&lock_path);
                    continue;
                }
            }

            if started.elapsed() > self.lock_timeout {
                return Err(CacheError::LockTimeout(lock_path));
            }
            std::thread::sleep(LOCK_RETRY_INTERVAL);
        }
    }

    fn each(&self) -> CacheResult<Vec<(String, EntryMeta)>> {
        let prefix = format!("cache/{}/", self.config.cache_type);
        let mut out = Vec::new();
        for path in self.client.list_with_prefix(&prefix)? {
            if path.ends_with(".lock") {
                continue;
            }
            if let Some(bytes) = self.client.get(&path)? {
                let metadata = self.client.metadata(&path)?.unwrap_or_default();
                out.push((
                    path,
                    EntryMeta { created_at: Utc::now(), size: bytes.len() as u64, expires_at: Self::meta_expiry(&metadata) },
                ));
            }
        }
        Ok(out)
    }
}

struct ObjectLockGuard {
    client: Arc<dyn ObjectClient>,
    path: String,
}

impl CacheLockGuard for ObjectLockGuard {}

impl Drop for ObjectLockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.client.delete(&self.path) {
            log::warn!("failed to release object-store lock {}: {err}", self.path);
        }
    }
}
