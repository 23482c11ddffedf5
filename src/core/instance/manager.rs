use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::model::{is_plain_file_name, Instance, LoaderType, ModEntry};
use super::reconcile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::manifest::{LoadStatus, Manifest, ManifestStore, MANAGED_SUBDIR};

/// Loader assigned to every instance created through the launcher.
pub const SUPPORTED_LOADER: LoaderType = LoaderType::Fabric;

/// Result of pointing the launcher at a new game directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameDirStatus {
    Updated { path: PathBuf },
    /// The requested directory doesn't exist; the setting was cleared.
    Cleared { requested: PathBuf },
}

/// Append-only edit of an instance record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceEdit {
    pub mod_name: Option<String>,
    pub resource_pack_name: Option<String>,
}

/// Manages the lifecycle of instances: manifest records plus their
/// directories under `<gameDir>/YAMIM/`.
pub struct InstanceManager {
    store: Arc<ManifestStore>,
    /// Overrides `<gameDir>/launcher_profiles.json`.
    launcher_profiles: Option<PathBuf>,
}

impl InstanceManager {
    pub fn new(store: Arc<ManifestStore>, launcher_profiles: Option<PathBuf>) -> Self {
        Self {
            store,
            launcher_profiles,
        }
    }

    /// List instances, reconciling the manifest with the filesystem first.
    pub async fn list(&self) -> LauncherResult<Vec<Instance>> {
        let session = self.store.lock().await;
        reconcile::reconcile(&session, self.launcher_profiles.as_deref()).await
    }

    pub async fn game_dir(&self) -> Option<PathBuf> {
        self.store.snapshot().await.game_dir
    }

    /// Point the launcher at `raw`. A directory that doesn't exist clears the
    /// setting instead.
    pub async fn set_game_dir(&self, raw: &str) -> LauncherResult<GameDirStatus> {
        let requested = absolutize(expand_home(raw.trim()))?;
        let session = self.store.lock().await;
        let mut manifest = session.load().await;

        let status = if requested.is_dir() {
            ensure_managed_root(&requested).await?;
            manifest.game_dir = Some(requested.clone());
            info!("Game directory set to {:?}", requested);
            GameDirStatus::Updated { path: requested }
        } else {
            warn!("Game directory {:?} doesn't exist, clearing it", requested);
            manifest.game_dir = None;
            GameDirStatus::Cleared { requested }
        };

        session.save(&manifest).await?;
        Ok(status)
    }

    /// Startup check: keep a configured game directory that still exists,
    /// otherwise adopt `fallback` when it exists.
    pub async fn initialize_game_dir(
        &self,
        fallback: Option<PathBuf>,
    ) -> LauncherResult<Option<PathBuf>> {
        let session = self.store.lock().await;
        let (mut manifest, status) = session.load_with_status().await;
        if status == LoadStatus::Corrupt {
            warn!(
                "Manifest {:?} is unreadable, leaving it untouched at startup",
                self.store.path()
            );
            return Ok(None);
        }

        if let Some(dir) = manifest.existing_game_dir().cloned() {
            ensure_managed_root(&dir).await?;
            return Ok(Some(dir));
        }

        match fallback.filter(|dir| dir.is_dir()) {
            Some(dir) => {
                ensure_managed_root(&dir).await?;
                info!("Using default game directory {:?}", dir);
                manifest.game_dir = Some(dir.clone());
                session.save(&manifest).await?;
                Ok(Some(dir))
            }
            None => {
                debug!("No usable game directory found");
                Ok(None)
            }
        }
    }

    /// Create an instance directory with its `mods/`, `mods/disabled/` and
    /// `resourcepacks/` folders and record it in the manifest.
    pub async fn create(&self, name: &str, version: &str) -> LauncherResult<Instance> {
        let name = name.trim();
        let version = version.trim();
        validate_new_instance(name, version)?;

        let session = self.store.lock().await;
        let mut manifest = session.load().await;
        let root = existing_managed_root(&manifest)?;

        if manifest.contains(name) {
            return Err(LauncherError::InstanceAlreadyExists(name.to_string()));
        }

        let instance = Instance::new(name.to_string(), version.to_string(), SUPPORTED_LOADER);
        let instance_dir = instance.dir(&root);
        if instance_dir.exists() {
            return Err(LauncherError::InstanceAlreadyExists(name.to_string()));
        }

        create_dir_safe(&instance.disabled_mods_dir(&root)).await?;
        create_dir_safe(&instance.resource_packs_dir(&root)).await?;

        manifest.instances.push(instance.clone());
        session.save(&manifest).await?;

        info!("Created instance '{}' ({} {})", instance.name, instance.loader, instance.version);
        Ok(instance)
    }

    /// Append a mod name and/or resource pack to an instance record.
    /// Entries already listed are left as they are.
    pub async fn edit(&self, name: &str, edit: InstanceEdit) -> LauncherResult<Instance> {
        let session = self.store.lock().await;
        let mut manifest = session.load().await;
        let instance = manifest
            .find_instance_mut(name)
            .ok_or_else(|| LauncherError::InstanceNotFound(name.to_string()))?;

        if let Some(mod_name) = non_empty(edit.mod_name) {
            if instance.has_mod(&mod_name) {
                debug!("Mod '{}' already listed on '{}'", mod_name, name);
            } else {
                instance.enabled_mods.push(ModEntry::discovered(mod_name));
            }
        }

        if let Some(pack) = non_empty(edit.resource_pack_name) {
            if instance.resource_packs.contains(&pack) {
                debug!("Resource pack '{}' already listed on '{}'", pack, name);
            } else {
                instance.resource_packs.push(pack);
            }
        }

        let updated = instance.clone();
        session.save(&manifest).await?;
        info!("Updated instance '{}'", name);
        Ok(updated)
    }

    /// Delete an instance: its directory tree, then its manifest record.
    pub async fn delete(&self, name: &str) -> LauncherResult<()> {
        let session = self.store.lock().await;
        let mut manifest = session.load().await;

        let instance = manifest
            .remove_instance(name)
            .ok_or_else(|| LauncherError::InstanceNotFound(name.to_string()))?;

        if !is_plain_file_name(&instance.name) {
            warn!("Record '{}' names no instance directory, dropping the record only", name);
        } else if let Some(root) = manifest.managed_root() {
            let instance_dir = instance.dir(&root);
            if instance_dir.exists() {
                tokio::fs::remove_dir_all(&instance_dir)
                    .await
                    .map_err(|source| LauncherError::io(&instance_dir, source))?;
            }
        }

        session.save(&manifest).await?;
        info!("Deleted instance {}", name);
        Ok(())
    }
}

fn validate_new_instance(name: &str, version: &str) -> LauncherResult<()> {
    if name.is_empty() || version.is_empty() {
        return Err(LauncherError::Validation(
            "Instance name and version are required.".into(),
        ));
    }
    if !name.chars().all(char::is_alphanumeric) {
        return Err(LauncherError::Validation(
            "Instance name must only contain letters and numbers.".into(),
        ));
    }
    Ok(())
}

/// `<gameDir>/YAMIM`, requiring the game directory to exist.
pub(crate) fn existing_managed_root(manifest: &Manifest) -> LauncherResult<PathBuf> {
    manifest
        .existing_game_dir()
        .map(|dir| dir.join(MANAGED_SUBDIR))
        .ok_or(LauncherError::GameDirNotConfigured)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(raw),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(raw),
    }
}

/// Anchor a relative path at the current working directory.
fn absolutize(path: PathBuf) -> LauncherResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|source| LauncherError::io(&path, source))?;
    Ok(cwd.join(path))
}

async fn ensure_managed_root(game_dir: &Path) -> LauncherResult<()> {
    create_dir_safe(&game_dir.join(MANAGED_SUBDIR)).await
}

pub(crate) async fn create_dir_safe(path: &Path) -> LauncherResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| LauncherError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::scratch_dir;

    async fn manager_with_game_dir(temp: &Path) -> (InstanceManager, PathBuf) {
        let game_dir = temp.join("minecraft");
        std::fs::create_dir_all(&game_dir).unwrap();
        let store = Arc::new(ManifestStore::new(temp.join("config.json")));
        let manager = InstanceManager::new(store, None);
        manager
            .set_game_dir(game_dir.to_str().unwrap())
            .await
            .unwrap();
        (manager, game_dir.join(MANAGED_SUBDIR))
    }

    #[tokio::test]
    async fn create_builds_directory_layout() {
        let temp = scratch_dir("manager-create");
        let (manager, root) = manager_with_game_dir(&temp).await;

        let instance = manager.create("Test123", "1.21").await.unwrap();
        assert_eq!(instance.loader, LoaderType::Fabric);
        assert_eq!(instance.version, "1.21");
        assert!(root.join("Test123").join("mods").join("disabled").is_dir());
        assert!(root.join("Test123").join("resourcepacks").is_dir());

        let listed = manager.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], instance);

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_without_mutation() {
        let temp = scratch_dir("manager-duplicate");
        let (manager, _) = manager_with_game_dir(&temp).await;

        manager.create("Test123", "1.21").await.unwrap();
        let err = manager.create("Test123", "1.20.1").await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceAlreadyExists(ref n) if n == "Test123"));

        let manifest = manager.store.snapshot().await;
        let matching: Vec<_> = manifest
            .instances
            .iter()
            .filter(|i| i.name == "Test123")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].version, "1.21");

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn existing_directory_blocks_creation() {
        let temp = scratch_dir("manager-dir-exists");
        let (manager, root) = manager_with_game_dir(&temp).await;
        std::fs::create_dir_all(root.join("Taken")).unwrap();

        let err = manager.create("Taken", "1.21").await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceAlreadyExists(_)));
        assert!(manager.store.snapshot().await.instances.is_empty());

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn create_validates_input_before_touching_disk() {
        let temp = scratch_dir("manager-validate");
        let (manager, root) = manager_with_game_dir(&temp).await;

        for (name, version) in [("", "1.21"), ("Name", " "), ("bad name", "1.21"), ("../x", "1.21")] {
            let err = manager.create(name, version).await.unwrap_err();
            assert!(matches!(err, LauncherError::Validation(_)), "{name:?}");
        }
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn create_requires_game_dir() {
        let temp = scratch_dir("manager-no-gamedir");
        let manager = InstanceManager::new(Arc::new(ManifestStore::new(temp.join("config.json"))), None);

        let err = manager.create("Solo", "1.21").await.unwrap_err();
        assert!(matches!(err, LauncherError::GameDirNotConfigured));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn missing_game_dir_is_cleared() {
        let temp = scratch_dir("manager-clear");
        let (manager, _) = manager_with_game_dir(&temp).await;

        let missing = temp.join("nope");
        let status = manager.set_game_dir(missing.to_str().unwrap()).await.unwrap();
        assert_eq!(status, GameDirStatus::Cleared { requested: missing });
        assert_eq!(manager.game_dir().await, None);

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn initialize_adopts_fallback_only_when_needed() {
        let temp = scratch_dir("manager-init");
        let store = Arc::new(ManifestStore::new(temp.join("config.json")));
        let manager = InstanceManager::new(store, None);
        let fallback = temp.join("default-mc");

        assert_eq!(manager.initialize_game_dir(Some(fallback.clone())).await.unwrap(), None);

        std::fs::create_dir_all(&fallback).unwrap();
        let adopted = manager.initialize_game_dir(Some(fallback.clone())).await.unwrap();
        assert_eq!(adopted, Some(fallback.clone()));
        assert!(fallback.join(MANAGED_SUBDIR).is_dir());
        assert_eq!(manager.game_dir().await, Some(fallback.clone()));

        let other = temp.join("other");
        std::fs::create_dir_all(&other).unwrap();
        let kept = manager.initialize_game_dir(Some(other)).await.unwrap();
        assert_eq!(kept, Some(fallback));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn edit_appends_without_duplicates() {
        let temp = scratch_dir("manager-edit");
        let (manager, _) = manager_with_game_dir(&temp).await;
        manager.create("Edit1", "1.21").await.unwrap();

        let edit = InstanceEdit {
            mod_name: Some("sodium".into()),
            resource_pack_name: Some("Faithful".into()),
        };
        manager.edit("Edit1", edit.clone()).await.unwrap();
        let updated = manager.edit("Edit1", edit).await.unwrap();

        assert_eq!(updated.enabled_mods, vec![ModEntry::discovered("sodium")]);
        assert_eq!(updated.resource_packs, vec!["Faithful".to_string()]);

        let err = manager.edit("Nope", InstanceEdit::default()).await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceNotFound(_)));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn delete_removes_record_and_tree() {
        let temp = scratch_dir("manager-delete");
        let (manager, root) = manager_with_game_dir(&temp).await;
        manager.create("Gone", "1.21").await.unwrap();
        std::fs::write(root.join("Gone").join("mods").join("a.jar"), b"jar").unwrap();

        manager.delete("Gone").await.unwrap();
        assert!(!root.join("Gone").exists());
        assert!(manager.list().await.unwrap().is_empty());

        let err = manager.delete("Gone").await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceNotFound(_)));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn deleting_a_dot_record_leaves_siblings_alone() {
        let temp = scratch_dir("manager-delete-dot");
        let (manager, root) = manager_with_game_dir(&temp).await;
        manager.create("Keep", "1.21").await.unwrap();
        std::fs::write(root.join("Keep").join("mods").join("a.jar"), b"jar").unwrap();

        for odd in [".", "..", "Keep/mods"] {
            let session = manager.store.lock().await;
            let mut manifest = session.load().await;
            manifest
                .instances
                .push(Instance::new(odd.into(), "1.21".into(), LoaderType::Fabric));
            session.save(&manifest).await.unwrap();
            drop(session);

            manager.delete(odd).await.unwrap();
            assert!(root.join("Keep").join("mods").join("a.jar").is_file(), "{odd}");
            assert!(!manager.store.snapshot().await.contains(odd));
        }
        assert_eq!(manager.list().await.unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn startup_keeps_records_it_cannot_read() {
        let temp = scratch_dir("manager-init-odd-record");
        let game_dir = temp.join("minecraft");
        for name in ["Good", "Odd"] {
            std::fs::create_dir_all(game_dir.join(MANAGED_SUBDIR).join(name)).unwrap();
        }
        let path = temp.join("config.json");
        std::fs::write(
            &path,
            r#"{"gameDir": null, "instances": [
                {"name": "Good", "version": "1.21", "loader": "fabric", "createdAt": "2024-01-01T00:00:00Z"},
                {"name": "Odd", "version": "1.20", "loader": "fabric", "createdAt": null}
            ]}"#,
        )
        .unwrap();
        let manager = InstanceManager::new(Arc::new(ManifestStore::new(path.clone())), None);

        manager.initialize_game_dir(Some(game_dir)).await.unwrap();
        let listed = manager.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].version, "1.21");

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let records = written["instances"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["loader"], "fabric");
        assert_eq!(records[1]["name"], "Odd");
        assert_eq!(records[1]["version"], "1.20");

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn startup_never_rewrites_a_corrupt_manifest() {
        let temp = scratch_dir("manager-init-corrupt");
        let fallback = temp.join("minecraft");
        std::fs::create_dir_all(&fallback).unwrap();
        let path = temp.join("config.json");
        std::fs::write(&path, "{ \"gameDir\": ").unwrap();
        let manager = InstanceManager::new(Arc::new(ManifestStore::new(path.clone())), None);

        assert_eq!(manager.initialize_game_dir(Some(fallback)).await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"gameDir\": ");

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn relative_game_dir_is_stored_absolute() {
        let temp = scratch_dir("manager-relative");
        let store = Arc::new(ManifestStore::new(temp.join("config.json")));
        let manager = InstanceManager::new(store, None);

        let status = manager
            .set_game_dir("yamim-no-such-relative-dir")
            .await
            .unwrap();
        let GameDirStatus::Cleared { requested } = status else {
            panic!("expected the missing directory to be cleared");
        };
        assert!(requested.is_absolute());

        let game_dir = temp.join("minecraft");
        std::fs::create_dir_all(&game_dir).unwrap();
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        relative.push(game_dir.strip_prefix(game_dir.components().next().unwrap()).unwrap());

        let status = manager.set_game_dir(relative.to_str().unwrap()).await.unwrap();
        let GameDirStatus::Updated { path } = status else {
            panic!("expected the relative directory to be accepted");
        };
        assert!(path.is_absolute());
        assert!(path.join(MANAGED_SUBDIR).is_dir());
        assert_eq!(manager.game_dir().await, Some(path));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        assert_eq!(expand_home("/srv/mc"), PathBuf::from("/srv/mc"));
        assert_eq!(expand_home("~user/mc"), PathBuf::from("~user/mc"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.minecraft"), home.join(".minecraft"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
