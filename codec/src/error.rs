use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown property tree type tag {0}")]
    UnknownPropertyType(u8),

    #[error("format error: {0}")]
    FormatError(String),
}

impl CodecError {
    pub(crate) fn short_read(what: &str) -> Self {
        Self::FormatError(format!("unexpected end of input while reading {what}"))
    }

    pub(crate) fn out_of_range(what: &str) -> Self {
        Self::FormatError(format!("value out of range while reading {what}"))
    }
}
