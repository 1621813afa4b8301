//! "At most one fill per key across all concurrent callers" built from the
//! backend's own primitives (§4.4 Single-flight contract), used directly by
//! tests here and by `fmm-http`'s `CacheDecorator`.

use camino::Utf8Path;

use crate::{backend::CacheBackend, error::CacheResult};

/// Returns the cached bytes for `key`, or runs `fetch` exactly once across
/// concurrent callers and stores its result before returning it.
pub fn get_or_fill(
    backend: &dyn CacheBackend,
    key: &str,
    fetch: impl FnOnce() -> CacheResult<Vec<u8>>,
) -> CacheResult<Vec<u8>> {
    if let Some(bytes) = backend.read(key)? {
        return Ok(bytes);
    }

    let _guard = backend.lock(key)?;

    // Re-check: another caller may have filled this key while we waited.
    if let Some(bytes) = backend.read(key)? {
        return Ok(bytes);
    }

    let bytes = fetch()?;
    let tmp = tempfile::NamedTempFile::new()?;
    std::fs::write(tmp.path(), &bytes)?;
    backend.store(key, Utf8Path::from_path(tmp.path()).expect("temp file path is valid utf8"))?;

    Ok(bytes)
}
