use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Http(#[from] fmm_http::HttpError),
    #[error(transparent)]
    Cache(#[from] fmm_cache::CacheError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed portal response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("\"{name}\" was not found on the portal")]
    NotFound { name: String },
    #[error("downloaded bytes hash to {actual}, expected {expected}")]
    DigestMismatch { expected: String, actual: String },
}

pub type PortalResult<T> = Result<T, PortalError>;
