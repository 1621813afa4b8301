use fmm_model::ModName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed info.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid mod name in info.json: {0}")]
    InvalidModName(#[from] fmm_model::InvalidModName),
    #[error("invalid version in info.json: {0}")]
    InvalidVersion(#[from] fmm_model::InvalidVersion),
    #[error("invalid dependency expression: {0}")]
    InvalidDependency(#[from] fmm_depend::InvalidExpression),
    #[error("\"{0}\" is reserved and cannot be disabled or removed")]
    IllegalOperation(ModName),
    #[error("\"{0}\" is not in the mod list")]
    ModNotInList(ModName),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
