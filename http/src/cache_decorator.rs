//! `CacheDecorator` (§4.5): caches non-streaming `GET` responses, applying
//! the single-flight discipline from `fmm_cache::get_or_fill`.

use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8Path;
use fmm_cache::CacheBackend;

use crate::{
    base_client::{BaseClient, HttpResponse, MultipartPart},
    error::HttpResult,
    events::{Event, EventBus},
};

pub struct CacheDecorator {
    inner: Arc<dyn BaseClient>,
    cache: Arc<dyn CacheBackend>,
    events: Arc<EventBus>,
}

impl CacheDecorator {
    pub fn new(inner: Arc<dyn BaseClient>, cache: Arc<dyn CacheBackend>, events: Arc<EventBus>) -> Self {
        Self { inner, cache, events }
    }

    fn respond_from_cache(&self, url: &str) -> HttpResult<Option<HttpResponse>> {
        if !self.cache.exist(url)? {
            return Ok(None);
        }
        let Some(bytes) = self.cache.read(url)? else {
            return Ok(None);
        };
        self.events.publish(Event::CacheHit { url: url.to_string() });
        Ok(Some(HttpResponse { status: 200, body: Some(bytes) }))
    }
}

#[async_trait]
impl BaseClient for CacheDecorator {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        stream_sink: Option<&Utf8Path>,
    ) -> HttpResult<HttpResponse> {
        // Only cacheable when the body is held in memory; streaming GETs
        // (and anything non-GET) pass straight through (§4.5).
        if stream_sink.is_some() {
            return self.inner.get(url, headers, stream_sink).await;
        }

        if let Some(hit) = self.respond_from_cache(url)? {
            return Ok(hit);
        }

        let _guard = self.cache.lock(url)?;
        if let Some(hit) = self.respond_from_cache(url)? {
            return Ok(hit);
        }

        let response = self.inner.get(url, headers, None).await?;
        self.events.publish(Event::CacheMiss { url: url.to_string() });

        if response.is_success() {
            if let Some(body) = &response.body {
                let tmp = tempfile::NamedTempFile::new()?;
                std::fs::write(tmp.path(), body)?;
                self.cache.store(url, Utf8Path::from_path(tmp.path()).expect("temp path is utf8"))?;
            }
        }

        Ok(response)
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
        content_type: &str,
    ) -> HttpResult<HttpResponse> {
        self.inner.post(url, headers, body, content_type).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        headers: &[(String, String)],
        parts: Vec<MultipartPart>,
    ) -> HttpResult<HttpResponse> {
        self.inner.post_multipart(url, headers, parts).await
    }
}
