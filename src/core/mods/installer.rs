use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::compat::{self, Compatibility, Incompatibility, MatchedRelease};
use super::registry::{ModRegistry, SearchHit};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::manager::{create_dir_safe, existing_managed_root};
use crate::core::instance::{is_plain_file_name, InstalledMod, ModEntry};
use crate::core::manifest::ManifestStore;

/// Result of an install request that reached the compatibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed { entry: InstalledMod },
    Rejected { reason: Incompatibility, message: String },
}

/// Installs registry mods into instances.
pub struct ModInstaller {
    store: Arc<ManifestStore>,
    registry: Arc<dyn ModRegistry>,
}

impl ModInstaller {
    pub fn new(store: Arc<ManifestStore>, registry: Arc<dyn ModRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn search(&self, query: &str) -> LauncherResult<Vec<SearchHit>> {
        self.registry.search(query).await
    }

    /// Install `mod_id` into `instance_name`.
    ///
    /// The artifact is written before the manifest records it, so a failure
    /// in between leaves an untracked jar rather than a dangling entry. The
    /// manifest lock is held for the whole sequence.
    pub async fn install(&self, mod_id: &str, instance_name: &str) -> LauncherResult<InstallOutcome> {
        let session = self.store.lock().await;
        let mut manifest = session.load().await;

        let instance = manifest
            .find_instance(instance_name)
            .cloned()
            .ok_or_else(|| LauncherError::InstanceNotFound(instance_name.to_string()))?;
        let root = existing_managed_root(&manifest)?;

        let release = match compat::resolve(self.registry.as_ref(), mod_id, &instance).await? {
            Compatibility::Compatible(release) => release,
            Compatibility::Incompatible(reason) => {
                info!("Not installing '{}' into '{}': {}", mod_id, instance_name, reason);
                return Ok(InstallOutcome::Rejected {
                    message: reason.to_string(),
                    reason,
                });
            }
        };
        let file_name = artifact_file_name(&release)?;

        let mods_dir = instance.mods_dir(&root);
        create_dir_safe(&mods_dir).await?;
        let dest = mods_dir.join(file_name);

        let bytes = self.registry.download(&release.url).await?;
        if let Some(expected) = release.sha1.as_deref() {
            verify_sha1(&bytes, expected, &dest)?;
        }
        write_artifact(&dest, &bytes).await?;
        debug!("Wrote {:?}", dest);

        let entry = InstalledMod {
            mod_id: release.mod_id.clone(),
            file_name: file_name.to_string(),
            display_name: release.title.clone(),
            icon_url: release.icon_url.clone(),
        };
        if let Some(target) = manifest.find_instance_mut(instance_name) {
            target.enabled_mods.push(ModEntry::Installed(entry.clone()));
        }
        session.save(&manifest).await?;

        info!(
            "Installed '{}' {} into '{}'",
            release.title, release.version_number, instance_name
        );
        Ok(InstallOutcome::Installed { entry })
    }
}

/// The registry's file name, refused if it would escape the mods folder.
fn artifact_file_name(release: &MatchedRelease) -> LauncherResult<&str> {
    let name = release.file_name.as_str();
    if !is_plain_file_name(name) {
        return Err(LauncherError::Validation(format!(
            "Refusing artifact file name '{name}'"
        )));
    }
    Ok(name)
}

fn verify_sha1(bytes: &[u8], expected: &str, dest: &Path) -> LauncherResult<()> {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let actual = hex::encode(hasher.finalize());
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(LauncherError::ChecksumMismatch {
            path: dest.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

async fn write_artifact(dest: &Path, bytes: &[u8]) -> LauncherResult<()> {
    // Handle dropped at the end of the block, before the manifest is touched.
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|source| LauncherError::io(dest, source))?;
    file.write_all(bytes)
        .await
        .map_err(|source| LauncherError::io(dest, source))?;
    file.flush()
        .await
        .map_err(|source| LauncherError::io(dest, source))?;
    Ok(())
}
