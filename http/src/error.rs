use serde::Deserialize;
use thiserror::Error;

pub type HttpResult<T> = Result<T, HttpError>;

/// The `{error, message}` body the portal API returns on 4xx/5xx responses,
/// mirrored from `factorio-web-util::mod_upload::ModUploadErrorResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("non-HTTPS url rejected: {0}")]
    UrlError(String),

    #[error("exceeded the maximum number of redirects")]
    TooManyRedirects,

    #[error("client error ({status}){}", api_suffix(body))]
    HttpClientError { status: u16, body: Option<ApiErrorBody> },

    #[error("not found{}", api_suffix(body))]
    HttpNotFound { body: Option<ApiErrorBody> },

    #[error("server error ({status}){}", api_suffix(body))]
    HttpServerError { status: u16, body: Option<ApiErrorBody> },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Cache(#[from] fmm_cache::CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn api_suffix(body: &Option<ApiErrorBody>) -> String {
    match body {
        Some(b) => format!(": {} ({})", b.message, b.error),
        None => String::new(),
    }
}

impl HttpError {
    pub fn is_retriable(&self) -> bool {
        match self {
            HttpError::Transport(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            },
            _ => false,
        }
    }
}
