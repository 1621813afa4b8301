use std::io;

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("timed out waiting for lock on {0:?}")]
    LockTimeout(String),

    #[error("cache backend error: {0}")]
    Backend(String),
}
