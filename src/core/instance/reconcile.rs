// ─── Reconciler ───
// Keeps the manifest's instance list in step with the directories under
// `<gameDir>/YAMIM/`. The filesystem decides which instances exist; the
// manifest keeps everything that cannot be derived from files.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::model::{timestamp, Instance};
use super::scanner;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::manifest::{record_name, Manifest, ManifestSession, MANAGED_SUBDIR};

/// Outcome of one filesystem pass over the manifest.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// File the game launcher records its profiles in, inside the game directory.
pub const LAUNCHER_PROFILES_FILE: &str = "launcher_profiles.json";

/// Reconcile the manifest held by `session` with the filesystem, persist it
/// if anything changed and return the instances in display order.
///
/// The most recently played instance is read from `launcher_profiles`, or
/// from `<gameDir>/launcher_profiles.json` when no path is given.
/// Directory listing errors propagate and nothing is saved.
pub async fn reconcile(
    session: &ManifestSession<'_>,
    launcher_profiles: Option<&Path>,
) -> LauncherResult<Vec<Instance>> {
    let mut manifest = session.load().await;
    let report = sync_with_filesystem(&mut manifest).await?;

    if report.changed() {
        info!(
            "Reconciled manifest: {} added, {} removed",
            report.added.len(),
            report.removed.len()
        );
        session.save(&manifest).await?;
    }

    let profiles_path = launcher_profiles
        .map(Path::to_path_buf)
        .or_else(|| manifest.game_dir.as_ref().map(|dir| dir.join(LAUNCHER_PROFILES_FILE)));
    let most_recent = match profiles_path {
        Some(path) => most_recently_played(&path).await,
        None => None,
    };

    let mut instances = manifest.instances;
    sort_instances(&mut instances, most_recent.as_deref());
    Ok(instances)
}

/// Add records for undiscovered instance directories and drop records whose
/// directory is gone. Leaves the manifest untouched when no game directory
/// or managed root is available.
///
/// A record survives only if its name is a direct child directory of the
/// managed root, and only the first record of a name is kept. Listing
/// errors propagate before anything is changed.
pub async fn sync_with_filesystem(manifest: &mut Manifest) -> LauncherResult<ReconcileReport> {
    let mut report = ReconcileReport::default();

    let Some(root) = manifest.existing_game_dir().map(|dir| dir.join(MANAGED_SUBDIR)) else {
        debug!("No game directory configured, skipping reconciliation");
        return Ok(report);
    };
    match tokio::fs::metadata(&root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            warn!("Managed root {:?} is not a directory, skipping reconciliation", root);
            return Ok(report);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("Managed root {:?} missing, skipping reconciliation", root);
            return Ok(report);
        }
        Err(source) => return Err(LauncherError::io(&root, source)),
    }

    let on_disk: BTreeSet<String> = scanner::list_subdirectories(&root)
        .await?
        .into_iter()
        .collect();

    let mut discovered = Vec::new();
    for name in &on_disk {
        if manifest.contains(name) {
            continue;
        }
        let path = root.join(name);
        let contents = scanner::scan(&path).await?;
        let created_at = scanner::creation_time(&path).await?;
        debug!("Discovered instance directory {:?}", path);
        discovered.push(Instance::discovered(name.clone(), contents, created_at));
    }

    let mut seen = HashSet::new();
    manifest.instances.retain(|instance| {
        let keep = on_disk.contains(&instance.name) && seen.insert(instance.name.clone());
        if !keep {
            report.removed.push(instance.name.clone());
        }
        keep
    });
    manifest.unreadable.retain(|raw| match record_name(raw) {
        Some(name) => {
            let keep = on_disk.contains(name) && seen.insert(name.to_string());
            if !keep {
                report.removed.push(name.to_string());
            }
            keep
        }
        None => true,
    });

    for instance in discovered {
        report.added.push(instance.name.clone());
        manifest.instances.push(instance);
    }

    Ok(report)
}

/// Order instances for display: the most recently played one first, the
/// rest newest-created first. Ties keep their manifest order.
pub fn sort_instances(instances: &mut [Instance], most_recently_played: Option<&str>) {
    instances.sort_by(|a, b| {
        let key_a = (Some(a.name.as_str()) == most_recently_played, a.created_at);
        let key_b = (Some(b.name.as_str()) == most_recently_played, b.created_at);
        key_b.cmp(&key_a)
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LauncherProfiles {
    #[serde(default)]
    selected_profile: Option<SelectedProfile>,
    #[serde(default)]
    profiles: HashMap<String, LauncherProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectedProfile {
    Named { name: String },
    Key(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LauncherProfile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    last_used: Option<String>,
}

impl LauncherProfiles {
    fn most_recent(self) -> Option<String> {
        match self.selected_profile {
            Some(SelectedProfile::Named { name }) => return Some(name),
            Some(SelectedProfile::Key(key)) => {
                let name = self
                    .profiles
                    .get(&key)
                    .and_then(|profile| profile.name.clone())
                    .unwrap_or(key);
                return Some(name);
            }
            None => {}
        }

        self.profiles
            .into_iter()
            .filter_map(|(key, profile)| {
                let used = timestamp::parse(profile.last_used.as_deref()?)?;
                Some((used, profile.name.filter(|n| !n.is_empty()).unwrap_or(key)))
            })
            .max_by_key(|(used, _)| *used)
            .map(|(_, name)| name)
    }
}

/// Name of the most recently played profile according to the game
/// launcher's `launcher_profiles.json`. Missing or unreadable files yield
/// `None`.
pub async fn most_recently_played(path: &Path) -> Option<String> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str::<LauncherProfiles>(&raw) {
        Ok(profiles) => profiles.most_recent(),
        Err(err) => {
            warn!("Cannot parse launcher profiles {:?}: {}", path, err);
            None
        }
    }
}
