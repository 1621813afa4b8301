//! Local filesystem `CacheBackend` (§4.4). Entries live under
//! `<root>/<type>/<hh>/<rest>`; locking uses a sidecar `.lock` file via the
//! `lockfile` crate, with the spec's "stale lock older than an hour may be
//! unlinked" retry policy layered on top (the crate itself only offers a
//! single non-blocking `create`).

use std::{
    fs,
    io,
    thread,
    time::{Duration, SystemTime},
};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use lockfile::Lockfile;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{CacheBackend, CacheConfig, CacheLockGuard, EntryMeta},
    compression,
    error::{CacheError, CacheResult},
    key::CacheDigest,
};

const STALE_LOCK_AGE: Duration = Duration::from_secs(60 * 60);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Serialize, Deserialize)]
struct StoredMeta {
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    compressed: bool,
}

pub struct FilesystemCacheBackend {
    root: Utf8PathBuf,
    config: CacheConfig,
}

impl FilesystemCacheBackend {
    pub fn new(root: Utf8PathBuf, config: CacheConfig) -> Self {
        Self { root, config }
    }

    fn type_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.config.cache_type)
    }

    fn data_path(&self, key: &str) -> Utf8PathBuf {
        let digest = CacheDigest::of(key);
        self.type_dir().join(digest.prefix()).join(digest.rest())
    }

    fn meta_path(&self, key: &str) -> Utf8PathBuf {
        let mut p = self.data_path(key);
        p.set_extension("meta");
        p
    }

    fn lock_path(&self, key: &str) -> Utf8PathBuf {
        let mut p = self.data_path(key);
        p.set_extension("lock");
        p
    }

    fn read_meta(&self, key: &str) -> CacheResult<Option<StoredMeta>> {
        let path = self.meta_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        match toml::from_str(&raw) {
            Ok(meta) => Ok(Some(meta)),
            Err(_) => Ok(None),
        }
    }

    fn is_expired(&self, meta: &StoredMeta) -> bool {
        meta.expires_at.is_some_and(|deadline| Utc::now() >= deadline)
    }

    fn write_atomic(&self, dest: &Utf8Path, bytes: &[u8]) -> CacheResult<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = dest.with_extension(format!("tmp-{}", std::process::id()));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, dest)?;
        Ok(())
    }
}

impl CacheBackend for FilesystemCacheBackend {
    fn exist(&self, key: &str) -> CacheResult<bool> {
        let data_path = self.data_path(key);
        if !data_path.exists() {
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
        let raw = fs::read(self.data_path(key))?;
        Ok(Some(compression::maybe_decompress(raw)?))
    }

    fn write_to(&self, key: &str, dest: &Utf8Path) -> CacheResult<bool> {
        match self.read(key)? {
            Some(bytes) => {
                self.write_atomic(dest, &bytes)?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn store(&self, key: &str, source_path: &Utf8Path) -> CacheResult<()> {
        let raw = fs::read(source_path)?;
        let compressed = compression::should_compress(self.config.compress_threshold, raw.len());
        let payload = if compressed { compression::compress(&raw)? } else { raw };

        self.write_atomic(&self.data_path(key), &payload)?;

        let meta = StoredMeta {
            created_at: Utc::now(),
            expires_at: self.config.ttl.and_then(|ttl| {
                Utc::now().checked_add_signed(chrono::Duration::from_std(ttl).ok()?)
            }),
            compressed,
        };
        let rendered = toml::to_string(&meta).map_err(|e| CacheError::Backend(e.to_string()))?;
        self.write_atomic(&self.meta_path(key), rendered.as_bytes())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let existed = self.data_path(key).exists();
        for path in [self.data_path(key), self.meta_path(key)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(existed)
    }

    fn clear(&self) -> CacheResult<()> {
        let dir = self.type_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
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
            None => Ok(!self.data_path(key).exists()),
        }
    }

    fn size(&self, key: &str) -> CacheResult<Option<u64>> {
        let path = self.data_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::metadata(&path)?.len()))
    }

    fn lock(&self, key: &str) -> CacheResult<Box<dyn CacheLockGuard>> {
        let lock_path = self.lock_path(key);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        loop {
            match Lockfile::create(&lock_path) {
                Ok(lock) => return Ok(Box::new(FsLockGuard(lock))),
                Err(_) => {
                    if lock_is_stale(&lock_path)? {
                        warn!("removing stale lock file at {lock_path:?}");
                        let _ = fs::remove_file(&lock_path);
                        continue;
                    }
                    debug!("waiting for lock at {lock_path:?}");
                    thread::sleep(LOCK_RETRY_INTERVAL);
                },
            }
        }
    }

    fn each(&self) -> CacheResult<Vec<(String, EntryMeta)>> {
        let dir = self.type_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for prefix_entry in fs::read_dir(&dir)? {
            let prefix_entry = prefix_entry?;
            if !prefix_entry.file_type()?.is_dir() {
                continue;
            }
            for file_entry in fs::read_dir(prefix_entry.path())? {
                let file_entry = file_entry?;
                let path = file_entry.path();
                let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
                if extension == "meta" || extension == "lock" || extension.starts_with("tmp-") {
                    continue;
                }

                let key_digest = format!(
                    "{}{}",
                    prefix_entry.file_name().to_string_lossy(),
                    path.file_name().unwrap().to_string_lossy()
                );
                let meta = fs::metadata(&path)?;
                let created_at: DateTime<Utc> = meta.modified().unwrap_or(SystemTime::now()).into();
                out.push((
                    key_digest,
                    EntryMeta { created_at, size: meta.len(), expires_at: None },
                ));
            }
        }
        Ok(out)
    }
}

fn lock_is_stale(lock_path: &Utf8Path) -> io::Result<bool> {
    if !lock_path.exists() {
        return Ok(false);
    }
    let modified = fs::metadata(lock_path)?.modified()?;
    Ok(modified.elapsed().unwrap_or_default() > STALE_LOCK_AGE)
}

struct FsLockGuard(Lockfile);

impl CacheLockGuard for FsLockGuard {}
