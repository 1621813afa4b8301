//! Multi-backend content-addressed cache with distributed locking (§4.4).
//!
//! Three `CacheBackend` implementations share one contract: filesystem,
//! remote key-value (over a first-party [`kv::KvClient`]), and remote
//! object store (over a first-party [`object::ObjectClient`]). Compression,
//! TTL, keying and single-flight filling are backend-agnostic concerns
//! layered on the same small trait.

pub mod backend;
pub mod compression;
pub mod error;
pub mod fs_backend;
pub mod key;
pub mod kv;
pub mod object;
pub mod single_flight;

pub use backend::{CacheBackend, CacheConfig, CacheLockGuard, EntryMeta};
pub use error::{CacheError, CacheResult};
pub use fs_backend::FilesystemCacheBackend;
pub use key::CacheDigest;
pub use kv::{KvCacheBackend, KvClient};
pub use object::{ObjectCacheBackend, ObjectClient};
pub use single_flight::get_or_fill;
