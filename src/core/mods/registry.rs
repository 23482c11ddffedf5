use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::LauncherResult;

/// Lightweight search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Project metadata used to decide installability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDetail {
    pub title: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Declared categories; loader names appear here.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// One published release of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectVersion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionFile {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub hashes: FileHashes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileHashes {
    #[serde(default)]
    pub sha1: Option<String>,
}

/// Read operations consumed from the remote mod registry.
#[async_trait]
pub trait ModRegistry: Send + Sync {
    async fn search(&self, query: &str) -> LauncherResult<Vec<SearchHit>>;

    async fn project(&self, id: &str) -> LauncherResult<ProjectDetail>;

    /// Published versions in the registry's own order.
    async fn project_versions(&self, id: &str) -> LauncherResult<Vec<ProjectVersion>>;

    /// Raw bytes of an artifact. Non-success statuses are `DownloadFailed`.
    async fn download(&self, url: &str) -> LauncherResult<Vec<u8>>;
}
