use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Codec(#[from] fmm_codec::CodecError),
    #[error("save archive has neither a level.dat0 nor a level-init.dat member")]
    MissingLevelMember,
}

pub type SaveResult<T> = Result<T, SaveError>;
