//! The remote key-value `CacheBackend` (§4.4), built on a small first-party
//! [`KvClient`] trait rather than a concrete Redis client (see DESIGN.md).

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    backend::{CacheBackend, CacheConfig, CacheLockGuard, EntryMeta},
    compression,
    error::{CacheError, CacheResult},
    key::CacheDigest,
};

const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);
const LOCK_ACQUIRE_RETRY: Duration = Duration::from_millis(25);

/// Minimal contract a remote key-value store must satisfy for
/// [`KvCacheBackend`] to build the full cache contract on top of it.
pub trait KvClient: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()>;
    fn delete(&self, key: &str) -> CacheResult<bool>;
    /// Conditional set used for lock acquisition: succeeds only if absent.
    fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<bool>;
    /// Compare-and-delete used for lock release.
    fn delete_if_value_matches(&self, key: &str, expected: &[u8]) -> CacheResult<bool>;
    fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>>;
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredMeta {
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    compressed: bool,
}

pub struct KvCacheBackend {
    client: Arc<dyn KvClient>,
    config: CacheConfig,
    prefix: String,
    lock_timeout: Duration,
}

impl KvCacheBackend {
    pub fn new(client: Arc<dyn KvClient>, prefix: impl Into<String>, config: CacheConfig) -> Self {
        Self { client, config, prefix: prefix.into(), lock_timeout: Duration::from_secs(30) }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    fn data_key(&self, key: &str) -> String {
        format!("{}:{}:{}", self.prefix, self.config.cache_type, CacheDigest::of(key).as_hex())
    }

    fn meta_key(&self, key: &str) -> String {
        format!("{}:{}:meta:{}", self.prefix, self.config.cache_type, CacheDigest::of(key).as_hex())
    }

    fn lock_key(&self, key: &str) -> String {
        format!("{}:{}:lock:{}", self.prefix, self.config.cache_type, CacheDigest::of(key).as_hex())
    }

    fn read_meta(&self, key: &str) -> CacheResult<Option<StoredMeta>> {
        match self.client.get(&self.meta_key(key))? {
            Some(bytes) => Ok(toml::from_str(&String::from_utf8_lossy(&bytes)).ok()),
            None => Ok(None),
        }
    }

    fn is_expired(&self, meta: &StoredMeta) -> bool {
        meta.expires_at.is_some_and(|deadline| Utc::now() >= deadline)
    }
}

impl CacheBackend for KvCacheBackend {
    fn exist(&self, key: &str) -> CacheResult<bool> {
        if self.client.get(&self.data_key(key))?.is_none() {
            return Ok(false);
        }
        match self.read_meta(key)? {
            Some(meta) => Ok(!self.is_expired(&meta)),
            None => Ok(true),
        }
    }

    fn read(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if !self.exist(key)? {
            return Ok(None);
        }
        match self.client.get(&self.data_key(key))? {
            Some(bytes) => Ok(Some(compression::maybe_decompress(bytes)?)),
            None => Ok(None),
        }
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

        self.client.set(&self.data_key(key), payload)?;

        let meta = StoredMeta {
            created_at: Utc::now(),
            expires_at: self.config.ttl.and_then(|ttl| {
                Utc::now().checked_add_signed(chrono::Duration::from_std(ttl).ok()?)
            }),
            compressed,
        };
        let rendered = toml::to_string(&meta).map_err(|e| CacheError::Backend(e.to_string()))?;
        self.client.set(&self.meta_key(key), rendered.into_bytes())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let existed = self.client.delete(&self.data_key(key))?;
        self.client.delete(&self.meta_key(key))?;
        Ok(existed)
    }

    fn clear(&self) -> CacheResult<()> {
        let prefix = format!("{}:{}:", self.prefix, self.config.cache_type);
        for key in self.client.keys_with_prefix(&prefix)? {
            self.client.delete(&key)?;
        }
        Ok(())
    }

    fn age(&self, key: &str) -> CacheResult<Option<Duration>> {
        Ok(self
            .read_meta(key)?
            .map(|meta| (Utc::now() - meta.created_at).to_std().unwrap_or_default()))
    }

    fn expired(&self, key: &str) -> CacheResult<bool> {
        match self.read_meta(key)? {
            Some(meta) => Ok(self.is_expired(&meta)),
            None => Ok(self.client.get(&self.data_key(key))?.is_none()),
        }
    }

    fn size(&self, key: &str) -> CacheResult<Option<u64>> {
        Ok(self.client.get(&self.data_key(key))?.map(|bytes| bytes.len() as u64))
    }

    fn lock(&self, key: &str) -> CacheResult<Box<dyn CacheLockGuard>> {
        let lock_key = self.lock_key(key);
        let token: [u8; 16] = rand::thread_rng().gen();
        let started = Instant::now();

        loop {
            if self.client.set_if_absent(&lock_key, token.to_vec(), DEFAULT_LOCK_TTL)? {
                return Ok(Box::new(KvLockGuard { client: self.client.clone(), key: lock_key, token: token.to_vec() }));
            }
            if started.elapsed() > self.lock_timeout {
                return Err(CacheError::LockTimeout(lock_key));
            }
            std::thread::sleep(LOCK_ACQUIRE_RETRY);
        }
    }

    fn each(&self) -> CacheResult<Vec<(String, EntryMeta)>> {
        let prefix = format!("{}:{}:", self.prefix, self.config.cache_type);
        let mut out = Vec::new();
        for key in self.client.keys_with_prefix(&prefix)? {
            if key.contains(":meta:") || key.contains(":lock:") {
                continue;
            }
            if let Some(bytes) = self.client.get(&key)? {
                let created_at = self
                    .read_meta_by_data_key(&key)?
                    .map(|meta| meta.created_at)
                    .unwrap_or_else(Utc::now);
                out.push((key, EntryMeta { created_at, size: bytes.len() as u64, expires_at: None }));
            }
        }
        Ok(out)
    }
}

impl KvCacheBackend {
    fn read_meta_by_data_key(&self, data_key: &str) -> CacheResult<Option<StoredMeta>> {
        let meta_key = data_key.replacen(
            &format!(":{}:", self.config.cache_type),
            &format!(":{}:meta:", self.config.cache_type),
            1,
        );
        match self.client.get(&meta_key)? {
            Some(bytes) => Ok(toml::from_str(&String::from_utf8_lossy(&bytes)).ok()),
            None => Ok(None),
        }
    }
}

struct KvLockGuard {
    client: Arc<dyn KvClient>,
    key: String,
    token: Vec<u8>,
}

impl CacheLockGuard for KvLockGuard {}

impl Drop for KvLockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.client.delete_if_value_matches(&self.key, &self.token) {
            log::warn!("failed to release kv lock {}: {err}", self.key);
        }
    }
}

#[cfg(test)]
pub mod test_double {
    use std::{
        collections::HashMap,
        sync::Mutex,
        time::{Duration, Instant},
    };

    use super::KvClient;
    use crate::error::CacheResult;

    #[derive(Default)]
    pub struct InMemoryKvClient {
        entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
    }

    impl InMemoryKvClient {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl KvClient for InMemoryKvClient {
        fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
            let mut entries = self.entries.lock().unwrap();
            if let Some((_, Some(deadline))) = entries.get(key) {
                if Instant::now() >= *deadline {
                    entries.remove(key);
                }
            }
            Ok(entries.get(key).map(|(v, _)| v.clone()))
        }

        fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
            self.entries.lock().unwrap().insert(key.to_string(), (value, None));
            Ok(())
        }

        fn delete(&self, key: &str) -> CacheResult<bool> {
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<bool> {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(key) {
                return Ok(false);
            }
            entries.insert(key.to_string(), (value, Some(Instant::now() + ttl)));
            Ok(true)
        }

        fn delete_if_value_matches(&self, key: &str, expected: &[u8]) -> CacheResult<bool> {
            let mut entries = self.entries.lock().unwrap();
            if entries.get(key).map(|(v, _)| v.as_slice()) == Some(expected) {
                entries.remove(key);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }
}
