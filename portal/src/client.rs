//! `PortalClient` (§4.11): typed operations over the remote catalog and
//! upload endpoints. The core's only collaborator for remote state.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use fmm_http::{BaseClient, Event, EventBus, HttpError, MultipartPart};
use sha1::{Digest, Sha1};

use crate::{
    credentials::{APICredential, ServiceCredential},
    error::{PortalError, PortalResult},
    types::{ListFilters, ListPage, ModFull, ModSummary},
};

const DEFAULT_BASE_URL: &str = "https://mods.factorio.com/api";

pub struct PortalClient {
    base_url: String,
    http: Arc<dyn BaseClient>,
    events: Arc<EventBus>,
}

impl PortalClient {
    pub fn new(http: Arc<dyn BaseClient>, events: Arc<EventBus>) -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), http, events }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list(&self, filters: &ListFilters) -> PortalResult<ListPage> {
        let query = filters.to_query_string();
        let url = if query.is_empty() {
            format!("{}/mods", self.base_url)
        } else {
            format!("{}/mods?{}", self.base_url, query)
        };
        let response = self.http.get(&url, &[], None).await?;
        let body = response.body.unwrap_or_default();
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get(&self, name: &str) -> PortalResult<ModSummary> {
        let url = format!("{}/mods/{name}", self.base_url);
        let response = self.http.get(&url, &[], None).await;
        match response {
            Err(HttpError::HttpNotFound { .. }) => Err(PortalError::NotFound { name: name.to_string() }),
            Err(e) => Err(e.into()),
            Ok(response) => Ok(serde_json::from_slice(&response.body.unwrap_or_default())?),
        }
    }

    pub async fn get_full(&self, name: &str) -> PortalResult<ModFull> {
        let url = format!("{}/mods/{name}/full", self.base_url);
        let response = self.http.get(&url, &[], None).await;
        match response {
            Err(HttpError::HttpNotFound { .. }) => Err(PortalError::NotFound { name: name.to_string() }),
            Err(e) => Err(e.into()),
            Ok(response) => Ok(serde_json::from_slice(&response.body.unwrap_or_default())?),
        }
    }

    /// Streams `download_url` to `output`, verifying the downloaded bytes
    /// hash to `expected_sha1` before the atomic rename into place.
    pub async fn download(
        &self,
        download_url: &str,
        output: &Utf8Path,
        expected_sha1: &str,
        credential: &ServiceCredential,
    ) -> PortalResult<()> {
        let url = format!(
            "{download_url}?username={}&token={}",
            credential.username(),
            credential.token()
        );

        let tmp_path = Utf8PathBuf::from(format!("{output}.part"));
        self.http.get(&url, &[], Some(&tmp_path)).await?;

        let bytes = tokio::fs::read(&tmp_path).await?;
        let actual = hex::encode(Sha1::digest(&bytes));
        if !actual.eq_ignore_ascii_case(expected_sha1) {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(PortalError::DigestMismatch { expected: expected_sha1.to_string(), actual });
        }

        tokio::fs::rename(&tmp_path, output).await?;
        Ok(())
    }

    /// Two-step upload: `init` (distinguishing publish-new vs. upload-update
    /// by whether `name` already exists), then a multipart `complete`. Both
    /// requests go through `self.http`, so they get the same timeouts and
    /// retry behavior as every other call this client makes.
    pub async fn upload(
        &self,
        name: &str,
        file_path: &Utf8Path,
        metadata: Option<serde_json::Value>,
        credential: &APICredential,
    ) -> PortalResult<()> {
        let already_exists = self.get(name).await.is_ok();
        let init_url = if already_exists {
            format!("{}/mods/{name}/upload/init", self.base_url)
        } else {
            format!("{}/mods/publish/init", self.base_url)
        };

        let headers = [credential.bearer_header()];
        let init_response = self.http.post(&init_url, &headers, Vec::new(), "application/json").await?;
        let init_body: serde_json::Value = serde_json::from_slice(&init_response.body.unwrap_or_default())?;
        let upload_url = init_body
            .get("upload_url")
            .and_then(|v| v.as_str())
            .unwrap_or(&init_url)
            .to_string();

        let file_bytes = tokio::fs::read(file_path).await?;
        let file_name = file_path.file_name().unwrap_or("mod.zip").to_string();
        let mut parts = vec![MultipartPart { field_name: "file".to_string(), file_name: Some(file_name), bytes: file_bytes }];

        if !already_exists {
            if let Some(metadata) = &metadata {
                parts.push(MultipartPart { field_name: "metadata".to_string(), file_name: None, bytes: metadata.to_string().into_bytes() });
            }
        }

        self.http.post_multipart(&upload_url, &headers, parts).await?;

        if already_exists {
            if let Some(metadata) = metadata {
                self.edit_details(name, metadata, credential).await?;
            }
        }

        self.events.publish(Event::ModChanged { name: name.to_string() });
        Ok(())
    }

    pub async fn edit_details(&self, name: &str, metadata: serde_json::Value, credential: &APICredential) -> PortalResult<()> {
        let url = format!("{}/mods/{name}/edit", self.base_url);
        let headers = [credential.bearer_header()];
        let body = serde_json::to_vec(&metadata)?;
        self.http.post(&url, &headers, body, "application/json").await?;
        self.events.publish(Event::ModChanged { name: name.to_string() });
        Ok(())
    }

    pub async fn add_image(&self, name: &str, image_path: &Utf8Path, credential: &APICredential) -> PortalResult<()> {
        let url = format!("{}/mods/{name}/images/add", self.base_url);
        let headers = [credential.bearer_header()];
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path.file_name().unwrap_or("image.png").to_string();
        let parts = vec![MultipartPart { field_name: "image".to_string(), file_name: Some(file_name), bytes }];
        self.http.post_multipart(&url, &headers, parts).await?;
        self.events.publish(Event::ModChanged { name: name.to_string() });
        Ok(())
    }

    pub async fn edit_image_order(&self, name: &str, order: &[String], credential: &APICredential) -> PortalResult<()> {
        let url = format!("{}/mods/{name}/images/edit", self.base_url);
        let headers = [credential.bearer_header()];
        let body = serde_json::to_vec(&serde_json::json!({ "images": order }))?;
        self.http.post(&url, &headers, body, "application/json").await?;
        self.events.publish(Event::ModChanged { name: name.to_string() });
        Ok(())
    }
}
