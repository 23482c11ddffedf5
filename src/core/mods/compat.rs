// ─── Compatibility Resolver ───
// Decides whether a registry project can be installed into an instance and
// which release to take. Reads the registry; never touches disk.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::registry::{ModRegistry, ProjectDetail, ProjectVersion};
use crate::core::error::LauncherResult;
use crate::core::instance::Instance;

/// Release picked for an instance, with its first file as the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRelease {
    pub mod_id: String,
    pub title: String,
    pub icon_url: Option<String>,
    pub version_number: String,
    pub url: String,
    pub file_name: String,
    pub sha1: Option<String>,
}

/// Why a project cannot be installed into an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Incompatibility {
    #[error("Mod '{title}' is not compatible with the '{loader}' loader.")]
    LoaderMismatch { title: String, loader: String },

    #[error("No compatible version of '{title}' found for Minecraft {game_version}.")]
    NoCompatibleVersion { title: String, game_version: String },

    #[error("Mod '{title}' is already installed.")]
    AlreadyInstalled { title: String },

    #[error("Version {version} of '{title}' has no downloadable file.")]
    MissingArtifact { title: String, version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Compatible(MatchedRelease),
    Incompatible(Incompatibility),
}

/// Fetch project detail and versions, then [`evaluate`] them.
pub async fn resolve(
    registry: &dyn ModRegistry,
    mod_id: &str,
    instance: &Instance,
) -> LauncherResult<Compatibility> {
    let detail = registry.project(mod_id).await?;
    let versions = registry.project_versions(mod_id).await?;
    Ok(evaluate(mod_id, &detail, &versions, instance))
}

/// Pure decision over registry data.
///
/// The loader must appear among the project's categories. The first version
/// (in registry order) listing the instance's game version wins; no version
/// ranking is attempted, and its first file is the artifact.
pub fn evaluate(
    mod_id: &str,
    detail: &ProjectDetail,
    versions: &[ProjectVersion],
    instance: &Instance,
) -> Compatibility {
    let title = detail.title.clone();
    let loader = instance.loader.as_str();

    if !detail
        .categories
        .iter()
        .any(|category| category.eq_ignore_ascii_case(loader))
    {
        debug!("'{}' lacks loader {} (categories {:?})", mod_id, loader, detail.categories);
        return Compatibility::Incompatible(Incompatibility::LoaderMismatch {
            title,
            loader: loader.to_string(),
        });
    }

    let Some(version) = versions
        .iter()
        .find(|version| version.game_versions.iter().any(|v| v == &instance.version))
    else {
        return Compatibility::Incompatible(Incompatibility::NoCompatibleVersion {
            title,
            game_version: instance.version.clone(),
        });
    };

    let Some(file) = version.files.first() else {
        return Compatibility::Incompatible(Incompatibility::MissingArtifact {
            title,
            version: version.version_number.clone(),
        });
    };

    if instance.has_registry_mod(mod_id) {
        return Compatibility::Incompatible(Incompatibility::AlreadyInstalled { title });
    }

    Compatibility::Compatible(MatchedRelease {
        mod_id: mod_id.to_string(),
        title,
        icon_url: detail.icon_url.clone(),
        version_number: version.version_number.clone(),
        url: file.url.clone(),
        file_name: file.filename.clone(),
        sha1: file.hashes.sha1.clone(),
    })
}
