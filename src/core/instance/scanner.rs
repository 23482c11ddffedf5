// ─── Filesystem Scanner ───
// Derives mod and resource-pack inventory from an instance directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Extension that marks a file in `mods/` as a mod archive.
pub const MOD_EXTENSION: &str = ".jar";

/// What an instance directory holds on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceContents {
    /// Logical mod name (file name without extension) -> file name.
    pub mods: BTreeMap<String, String>,
    /// Names of the directories under `resourcepacks/`.
    pub resource_packs: BTreeSet<String>,
}

/// Scan `mods/` and `resourcepacks/` of an instance directory.
///
/// Missing subdirectories yield empty results. Subdirectories of `mods/`
/// (such as `disabled/`) and plain files in `resourcepacks/` are ignored.
pub async fn scan(instance_path: &Path) -> LauncherResult<InstanceContents> {
    let mut contents = InstanceContents::default();

    let mods_path = instance_path.join("mods");
    if mods_path.is_dir() {
        for (file_name, is_dir) in list_entries(&mods_path).await? {
            if is_dir {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(MOD_EXTENSION) {
                contents.mods.insert(name.to_string(), file_name.clone());
            }
        }
    }

    let packs_path = instance_path.join("resourcepacks");
    if packs_path.is_dir() {
        for (name, is_dir) in list_entries(&packs_path).await? {
            if is_dir {
                contents.resource_packs.insert(name);
            }
        }
    }

    Ok(contents)
}

/// Creation time of a directory, falling back to the modification time on
/// filesystems that don't record birth time.
pub async fn creation_time(path: &Path) -> LauncherResult<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|source| LauncherError::io(path, source))?;

    let stamp = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_err(|source| LauncherError::io(path, source))?;

    Ok(DateTime::<Utc>::from(stamp))
}

/// Names of the subdirectories of `root`, sorted.
pub async fn list_subdirectories(root: &Path) -> LauncherResult<Vec<String>> {
    let mut names: Vec<String> = list_entries(root)
        .await?
        .into_iter()
        .filter_map(|(name, is_dir)| is_dir.then_some(name))
        .collect();
    names.sort();
    Ok(names)
}

async fn list_entries(dir: &Path) -> LauncherResult<Vec<(String, bool)>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|source| LauncherError::io(dir, source))?;

    let mut out = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| LauncherError::io(dir, source))?
    {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 entry in {:?}", dir);
            continue;
        };
        // Follow symlinks so a linked instance folder still counts.
        let path = entry.path();
        let is_dir = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.is_dir(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Skipping vanished or dangling entry {:?}", path);
                continue;
            }
            Err(source) => return Err(LauncherError::io(path, source)),
        };
        out.push((name, is_dir));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::scratch_dir;

    #[tokio::test]
    async fn scan_collects_jars_and_pack_directories() {
        let temp = scratch_dir("scanner-collects");
        let instance = temp.join("Modded");
        std::fs::create_dir_all(instance.join("mods").join("disabled")).unwrap();
        std::fs::create_dir_all(instance.join("resourcepacks").join("Faithful")).unwrap();
        std::fs::write(instance.join("mods").join("sodium-0.5.8.jar"), b"jar").unwrap();
        std::fs::write(instance.join("mods").join("notes.txt"), b"txt").unwrap();
        std::fs::write(instance.join("mods").join("disabled").join("old.jar"), b"jar").unwrap();
        std::fs::write(instance.join("resourcepacks").join("pack.zip"), b"zip").unwrap();

        let contents = scan(&instance).await.unwrap();

        assert_eq!(contents.mods.len(), 1);
        assert_eq!(
            contents.mods.get("sodium-0.5.8").map(String::as_str),
            Some("sodium-0.5.8.jar")
        );
        assert_eq!(
            contents.resource_packs.iter().collect::<Vec<_>>(),
            vec!["Faithful"]
        );

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn scan_of_bare_directory_is_empty() {
        let temp = scratch_dir("scanner-bare");
        let contents = scan(&temp).await.unwrap();
        assert_eq!(contents, InstanceContents::default());
        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn creation_time_is_stable_for_unchanged_directory() {
        let temp = scratch_dir("scanner-ctime");
        let first = creation_time(&temp).await.unwrap();
        let second = creation_time(&temp).await.unwrap();
        assert_eq!(first, second);
        let _ = std::fs::remove_dir_all(&temp);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_entry_fails_the_listing() {
        let temp = scratch_dir("scanner-loop");
        std::fs::create_dir_all(temp.join("A")).unwrap();
        std::os::unix::fs::symlink(temp.join("loop"), temp.join("loop")).unwrap();

        let err = list_subdirectories(&temp).await.unwrap_err();
        assert!(matches!(err, LauncherError::Io { ref path, .. } if path.ends_with("loop")));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_link_is_skipped() {
        let temp = scratch_dir("scanner-dangling");
        std::fs::create_dir_all(temp.join("A")).unwrap();
        std::os::unix::fs::symlink(temp.join("gone"), temp.join("link")).unwrap();

        let names = list_subdirectories(&temp).await.unwrap();
        assert_eq!(names, vec!["A".to_string()]);

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn list_subdirectories_skips_files() {
        let temp = scratch_dir("scanner-subdirs");
        std::fs::create_dir_all(temp.join("B")).unwrap();
        std::fs::create_dir_all(temp.join("A")).unwrap();
        std::fs::write(temp.join("stray.txt"), b"x").unwrap();

        let names = list_subdirectories(&temp).await.unwrap();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);

        let _ = std::fs::remove_dir_all(&temp);
    }
}
