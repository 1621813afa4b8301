//! Shapes returned by the remote catalog. Kept deliberately small: only the
//! fields the resolver and the CLI actually consume.

use fmm_model::ModName;
use serde::{Deserialize, Serialize};

/// The subset of a release's embedded `info.json` the resolver needs.
/// Mirrors the wire shape `fmm-registry` reads off installed archives
/// (`dependencies` as grammar strings, parsed by the caller).
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Release {
    pub version: String,
    pub download_url: String,
    pub sha1: String,
    #[serde(default)]
    pub factorio_version: String,
    #[serde(default, rename = "info_json")]
    pub info: ReleaseInfo,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ModSummary {
    pub name: ModName,
    pub title: String,
    pub owner: String,
    pub summary: String,
    pub downloads_count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ModFull {
    pub name: ModName,
    pub title: String,
    pub owner: String,
    pub description: String,
    pub releases: Vec<Release>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListFilters {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ListFilters {
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(q) = &self.query {
            parts.push(format!("q={}", urlencode(q)));
        }
        if let Some(page) = self.page {
            parts.push(format!("page={page}"));
        }
        if let Some(page_size) = self.page_size {
            parts.push(format!("page_size={page_size}"));
        }
        parts.join("&")
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') {
                c.to_string()
            } else {
                format!("%{:02X}", c as u32)
            }
        })
        .collect()
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListPage {
    pub results: Vec<ModSummary>,
    pub page_count: u32,
}
