//! `RetryDecorator` (§4.5): exponential backoff with jitter over any
//! `BaseClient`. Only transport-level failures are retried; 4xx/5xx are
//! server-issued and left to the caller.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use camino::Utf8Path;
use log::warn;
use rand::Rng;

use crate::{
    base_client::{BaseClient, HttpResponse, MultipartPart},
    error::{HttpError, HttpResult},
};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub tries: u32,
    pub base: Duration,
    pub multiplier: f64,
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { tries: 3, base: Duration::from_secs(1), multiplier: 2.0, jitter: 0.25 }
    }
}

impl RetryConfig {
    /// `base * multiplier^(attempt-1)`, jittered by a uniform factor.
    fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let nominal = self.base.as_secs_f64() * self.multiplier.powi(attempt as i32 - 1);
        let spread = nominal * self.jitter;
        let jittered = rand::thread_rng().gen_range((nominal - spread).max(0.0)..=(nominal + spread));
        Duration::from_secs_f64(jittered)
    }
}

type RetryHook = dyn Fn(&HttpError, u32, Duration, Duration) + Send + Sync;

pub struct RetryDecorator {
    inner: Arc<dyn BaseClient>,
    config: RetryConfig,
    on_retry: Option<Arc<RetryHook>>,
}

impl RetryDecorator {
    pub fn new(inner: Arc<dyn BaseClient>) -> Self {
        Self { inner, config: RetryConfig::default(), on_retry: None }
    }

    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry_hook(mut self, hook: impl Fn(&HttpError, u32, Duration, Duration) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    async fn run<F, Fut>(&self, started: Instant, mut call: F) -> HttpResult<HttpResponse>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = HttpResult<HttpResponse>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retriable() && attempt < self.config.tries => {
                    let next_interval = self.config.interval_for_attempt(attempt);
                    warn!("retriable error on attempt {attempt}/{}: {err}", self.config.tries);
                    if let Some(hook) = &self.on_retry {
                        hook(&err, attempt, started.elapsed(), next_interval);
                    }
                    tokio::time::sleep(next_interval).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl BaseClient for RetryDecorator {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        stream_sink: Option<&Utf8Path>,
    ) -> HttpResult<HttpResponse> {
        let started = Instant::now();
        self.run(started, || self.inner.get(url, headers, stream_sink)).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
        content_type: &str,
    ) -> HttpResult<HttpResponse> {
        let started = Instant::now();
        self.run(started, || self.inner.post(url, headers, body.clone(), content_type)).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        headers: &[(String, String)],
        parts: Vec<MultipartPart>,
    ) -> HttpResult<HttpResponse> {
        let started = Instant::now();
        self.run(started, || self.inner.post_multipart(url, headers, parts.clone())).await
    }
}
