use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::mods::registry::{ModRegistry, ProjectDetail, ProjectVersion, SearchHit};

/// Fresh per-test directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("yamim-{}-{}", label, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// In-memory registry serving a single project.
pub struct FakeRegistry {
    detail: ProjectDetail,
    versions: Vec<ProjectVersion>,
    hits: Vec<SearchHit>,
    artifact: Vec<u8>,
    download_status: Option<u16>,
    downloads: AtomicUsize,
}

impl FakeRegistry {
    pub fn new(detail: ProjectDetail, versions: Vec<ProjectVersion>) -> Self {
        Self {
            detail,
            versions,
            hits: Vec::new(),
            artifact: Vec::new(),
            download_status: None,
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn with_artifact(mut self, bytes: Vec<u8>) -> Self {
        self.artifact = bytes;
        self
    }

    /// Every download fails with `status`.
    pub fn with_download_status(mut self, status: u16) -> Self {
        self.download_status = Some(status);
        self
    }

    pub fn with_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.hits = hits;
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModRegistry for FakeRegistry {
    async fn search(&self, query: &str) -> LauncherResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.hits.clone())
    }

    async fn project(&self, _id: &str) -> LauncherResult<ProjectDetail> {
        Ok(self.detail.clone())
    }

    async fn project_versions(&self, _id: &str) -> LauncherResult<Vec<ProjectVersion>> {
        Ok(self.versions.clone())
    }

    async fn download(&self, url: &str) -> LauncherResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.download_status {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status,
            });
        }
        Ok(self.artifact.clone())
    }
}
