// ─── Manifest Store ───
// Loads and saves `config.json`. Every read-modify-write sequence goes
// through a `ManifestSession`, which holds the store's in-process lock.
// Nothing guards against a second process writing the same file.

use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::model::Manifest;
use crate::core::error::{LauncherError, LauncherResult};

pub struct ManifestStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ManifestStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the manifest lock for one operation.
    pub async fn lock(&self) -> ManifestSession<'_> {
        ManifestSession {
            store: self,
            _guard: self.lock.lock().await,
        }
    }

    /// Read the current manifest under the lock, without keeping it.
    pub async fn snapshot(&self) -> Manifest {
        self.lock().await.load().await
    }

    /// Write an empty manifest if none exists yet.
    pub async fn ensure_exists(&self) -> LauncherResult<()> {
        let session = self.lock().await;
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        debug!("Creating empty manifest at {:?}", self.path);
        session.save(&Manifest::default()).await
    }
}

/// Exclusive access to the manifest for the lifetime of one operation.
pub struct ManifestSession<'a> {
    store: &'a ManifestStore,
    _guard: MutexGuard<'a, ()>,
}

/// How the manifest file looked when it was last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Missing,
    Loaded,
    /// Unreadable or not JSON at all; an empty manifest stood in for it.
    Corrupt,
}

impl ManifestSession<'_> {
    /// Load the manifest. A missing or malformed file yields an empty
    /// manifest; the file on disk is left untouched.
    pub async fn load(&self) -> Manifest {
        self.load_with_status().await.0
    }

    /// Like [`load`](Self::load), also telling whether the empty manifest
    /// replaced a file that exists but could not be read.
    pub async fn load_with_status(&self) -> (Manifest, LoadStatus) {
        read_manifest(&self.store.path).await
    }

    /// Overwrite the manifest file with `manifest`.
    pub async fn save(&self, manifest: &Manifest) -> LauncherResult<()> {
        write_manifest(&self.store.path, manifest).await
    }
}

async fn read_manifest(path: &Path) -> (Manifest, LoadStatus) {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No manifest at {:?}, starting empty", path);
            return (Manifest::default(), LoadStatus::Missing);
        }
        Err(err) => {
            warn!("Cannot read manifest {:?}: {}", path, err);
            return (Manifest::default(), LoadStatus::Corrupt);
        }
    };

    match serde_json::from_str::<Manifest>(&raw) {
        Ok(manifest) => (manifest, LoadStatus::Loaded),
        Err(err) => {
            warn!("Corrupt manifest at {:?}, treating as empty: {}", path, err);
            (Manifest::default(), LoadStatus::Corrupt)
        }
    }
}

async fn write_manifest(path: &Path, manifest: &Manifest) -> LauncherResult<()> {
    let json = serde_json::to_string_pretty(manifest)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| LauncherError::io(parent, source))?;
    }

    tokio::fs::write(path, json)
        .await
        .map_err(|source| LauncherError::io(path, source))
}
