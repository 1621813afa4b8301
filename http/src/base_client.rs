//! `BaseClient`, the bottom of the decorator stack (§4.5), implemented once
//! over `reqwest::Client` exactly as the teacher's `BananaClient` is
//! (`scraper/src/banana_scraper.rs`) and mirroring
//! `factorio-web-util::mod_upload`'s `{error, message}` JSON error shape.

use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8Path;
use futures_util::StreamExt;
use reqwest::{redirect::Policy, Client, ClientBuilder};
use tokio::io::AsyncWriteExt;

use crate::error::{ApiErrorBody, HttpError, HttpResult};

const MAX_REDIRECTS: usize = 10;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// `None` when the body was streamed directly to a `stream_sink`.
    pub body: Option<Vec<u8>>,
}

/// One part of a `multipart/form-data` body: a file part when `file_name`
/// is set, a plain form field otherwise.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub field_name: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait BaseClient: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        stream_sink: Option<&Utf8Path>,
    ) -> HttpResult<HttpResponse>;

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
        content_type: &str,
    ) -> HttpResult<HttpResponse>;

    /// A `multipart/form-data` POST, for upload endpoints (§4.11 `upload`,
    /// `add_image`). Goes through the same decorator stack as `get`/`post`
    /// so uploads get the same timeouts and retry behavior.
    async fn post_multipart(
        &self,
        url: &str,
        headers: &[(String, String)],
        parts: Vec<MultipartPart>,
    ) -> HttpResult<HttpResponse>;
}

pub struct ReqwestBaseClient {
    client: Client,
}

impl ReqwestBaseClient {
    pub fn new() -> HttpResult<Self> {
        let client = ClientBuilder::new()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    fn require_https(url: &str) -> HttpResult<()> {
        let parsed = reqwest::Url::parse(url).map_err(|_| HttpError::UrlError(url.to_string()))?;
        if parsed.scheme() != "https" {
            return Err(HttpError::UrlError(url.to_string()));
        }
        Ok(())
    }

    fn apply_headers(mut builder: reqwest::RequestBuilder, headers: &[(String, String)]) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder
    }

    async fn classify_error(response: reqwest::Response) -> HttpResult<HttpError> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.unwrap_or_default();
        let body: Option<ApiErrorBody> = serde_json::from_slice(&bytes).ok();

        Ok(if status == 404 {
            HttpError::HttpNotFound { body }
        } else if (400..500).contains(&status) {
            HttpError::HttpClientError { status, body }
        } else {
            HttpError::HttpServerError { status, body }
        })
    }

    async fn finish(response: reqwest::Response, stream_sink: Option<&Utf8Path>) -> HttpResult<HttpResponse> {
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(Self::classify_error(response).await?);
        }

        match stream_sink {
            Some(path) => {
                let mut file = tokio::fs::File::create(path).await?;
                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    file.write_all(&chunk?).await?;
                }
                Ok(HttpResponse { status, body: None })
            },
            None => {
                let bytes = response.bytes().await?;
                Ok(HttpResponse { status, body: Some(bytes.to_vec()) })
            },
        }
    }

    fn map_redirect_error(err: reqwest::Error) -> HttpError {
        if err.is_redirect() {
            HttpError::TooManyRedirects
        } else {
            HttpError::Transport(err)
        }
    }
}

#[async_trait]
impl BaseClient for ReqwestBaseClient {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        stream_sink: Option<&Utf8Path>,
    ) -> HttpResult<HttpResponse> {
        Self::require_https(url)?;
        let builder = Self::apply_headers(self.client.get(url), headers);
        let response = builder.send().await.map_err(Self::map_redirect_error)?;
        Self::finish(response, stream_sink).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
        content_type: &str,
    ) -> HttpResult<HttpResponse> {
        Self::require_https(url)?;
        let builder = Self::apply_headers(self.client.post(url), headers)
            .header("content-type", content_type)
            .body(body);
        let response = builder.send().await.map_err(Self::map_redirect_error)?;
        Self::finish(response, None).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        headers: &[(String, String)],
        parts: Vec<MultipartPart>,
    ) -> HttpResult<HttpResponse> {
        Self::require_https(url)?;

        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            let mut reqwest_part = reqwest::multipart::Part::bytes(part.bytes);
            if let Some(file_name) = part.file_name {
                reqwest_part = reqwest_part.file_name(file_name);
            }
            form = form.part(part.field_name, reqwest_part);
        }

        let builder = Self::apply_headers(self.client.post(url), headers).multipart(form);
        let response = builder.send().await.map_err(Self::map_redirect_error)?;
        Self::finish(response, None).await
    }
}
