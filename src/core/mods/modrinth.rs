// ─── Modrinth ───
// `ModRegistry` backed by the Modrinth v2 REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::registry::{ModRegistry, ProjectDetail, ProjectVersion, SearchHit};
use crate::core::error::{LauncherError, LauncherResult};

pub const MODRINTH_API_BASE: &str = "https://api.modrinth.com/v2";

/// Only plain mods are offered; modpacks, shaders and the like are not.
const SEARCH_FACETS: &str = r#"[["project_type:mod"]]"#;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

pub struct ModrinthClient {
    client: Client,
    base_url: String,
    search_limit: u32,
}

impl ModrinthClient {
    pub fn new(client: Client, base_url: &str, search_limit: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            search_limit,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> LauncherResult<T> {
        let resp = self.client.get(url).query(query).send().await?;

        if !resp.status().is_success() {
            return Err(LauncherError::RemoteUnavailable {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ModRegistry for ModrinthClient {
    async fn search(&self, query: &str) -> LauncherResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint("search");
        let response: SearchResponse = self
            .get_json(
                &url,
                &[
                    ("query", query.to_string()),
                    ("limit", self.search_limit.to_string()),
                    ("facets", SEARCH_FACETS.to_string()),
                ],
            )
            .await?;

        debug!("Search '{}' returned {} hits", query, response.hits.len());
        Ok(response.hits)
    }

    async fn project(&self, id: &str) -> LauncherResult<ProjectDetail> {
        let url = self.endpoint(&format!("project/{id}"));
        self.get_json(&url, &[]).await
    }

    async fn project_versions(&self, id: &str) -> LauncherResult<Vec<ProjectVersion>> {
        let url = self.endpoint(&format!("project/{id}/version"));
        self.get_json(&url, &[]).await
    }

    async fn download(&self, url: &str) -> LauncherResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        info!("Downloaded {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }
}
