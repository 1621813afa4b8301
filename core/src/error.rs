//! Aggregated error taxonomy exposed across the core's boundary (§6).

use fmm_model::ModName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Http(#[from] fmm_http::HttpError),
    #[error(transparent)]
    Cache(#[from] fmm_cache::CacheError),
    #[error(transparent)]
    Registry(#[from] fmm_registry::RegistryError),
    #[error(transparent)]
    Resolve(#[from] fmm_depend::ResolveError),
    #[error(transparent)]
    Expression(#[from] fmm_depend::InvalidExpression),
    #[error(transparent)]
    Portal(#[from] fmm_portal::PortalError),
    #[error(transparent)]
    Save(#[from] fmm_save::SaveError),
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("\"{0}\" was not found")]
    NotFound(String),
    #[error("validation failed with {0} finding(s)")]
    ValidationFailed(usize),
    #[error("\"{0}\" is already installed")]
    AlreadyInstalled(ModName),
}

pub type CoreResult<T> = Result<T, CoreError>;
