use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::scanner::InstanceContents;

/// Version string for instances whose target game version cannot be inferred.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Supported mod loaders. Names the launcher doesn't know are kept verbatim so
/// a manifest written by something else survives a load/save cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum LoaderType {
    Fabric,
    Forge,
    NeoForge,
    Quilt,
    #[default]
    Unknown,
    Other(String),
}

impl LoaderType {
    pub fn as_str(&self) -> &str {
        match self {
            LoaderType::Fabric => "fabric",
            LoaderType::Forge => "forge",
            LoaderType::NeoForge => "neoforge",
            LoaderType::Quilt => "quilt",
            LoaderType::Unknown => "unknown",
            LoaderType::Other(name) => name,
        }
    }
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LoaderType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "fabric" => LoaderType::Fabric,
            "forge" => LoaderType::Forge,
            "neoforge" => LoaderType::NeoForge,
            "quilt" => LoaderType::Quilt,
            "unknown" | "" => LoaderType::Unknown,
            _ => LoaderType::Other(raw),
        }
    }
}

impl From<LoaderType> for String {
    fn from(loader: LoaderType) -> Self {
        loader.as_str().to_string()
    }
}

/// A mod that was installed through the registry and carries its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledMod {
    #[serde(rename = "modId")]
    pub mod_id: String,
    #[serde(rename = "modJar")]
    pub file_name: String,
    #[serde(rename = "modName")]
    pub display_name: String,
    #[serde(rename = "modIcon", default)]
    pub icon_url: Option<String>,
}

/// A mod known only from a file in the `mods/` folder (or a manual edit).
/// Persisted as a plain string: the jar name without its extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DiscoveredMod {
    pub name: String,
}

/// Entry of `enabledMods`. Older manifests hold plain strings, the installer
/// writes structured records; both shapes share one list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ModEntry {
    Installed(InstalledMod),
    Discovered(DiscoveredMod),
}

impl ModEntry {
    pub fn discovered(name: impl Into<String>) -> Self {
        ModEntry::Discovered(DiscoveredMod { name: name.into() })
    }

    /// Key the entry is unique by: the registry id, or the derived name.
    pub fn key(&self) -> &str {
        match self {
            ModEntry::Installed(installed) => &installed.mod_id,
            ModEntry::Discovered(discovered) => &discovered.name,
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            ModEntry::Installed(installed) => installed.file_name.clone(),
            ModEntry::Discovered(discovered) => {
                format!("{}{}", discovered.name, super::scanner::MOD_EXTENSION)
            }
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ModEntry::Installed(installed) => &installed.display_name,
            ModEntry::Discovered(discovered) => &discovered.name,
        }
    }

    pub fn registry_id(&self) -> Option<&str> {
        match self {
            ModEntry::Installed(installed) => Some(&installed.mod_id),
            ModEntry::Discovered(_) => None,
        }
    }
}

/// One instance record of the manifest.
///
/// The name doubles as the directory name under `<gameDir>/YAMIM/` and as
/// the primary key of the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    #[serde(default = "unknown_version")]
    pub version: String,
    #[serde(default)]
    pub loader: LoaderType,
    #[serde(default)]
    pub enabled_mods: Vec<ModEntry>,
    #[serde(default)]
    pub disabled_mods: Vec<String>,
    #[serde(default)]
    pub resource_packs: Vec<String>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Keys this launcher doesn't model, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instance {
    /// Create a fresh instance record for an explicit create request.
    pub fn new(name: String, version: String, loader: LoaderType) -> Self {
        Self {
            name,
            version,
            loader,
            enabled_mods: Vec::new(),
            disabled_mods: Vec::new(),
            resource_packs: Vec::new(),
            created_at: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Build a record for a directory found on disk but absent from the
    /// manifest. Version and loader cannot be inferred from files.
    pub fn discovered(name: String, contents: InstanceContents, created_at: DateTime<Utc>) -> Self {
        Self {
            name,
            version: unknown_version(),
            loader: LoaderType::Unknown,
            enabled_mods: contents.mods.into_keys().map(ModEntry::discovered).collect(),
            disabled_mods: Vec::new(),
            resource_packs: contents.resource_packs.into_iter().collect(),
            created_at,
            extra: Map::new(),
        }
    }

    pub fn has_mod(&self, key: &str) -> bool {
        self.enabled_mods.iter().any(|entry| entry.key() == key)
    }

    /// Whether a registry install of `mod_id` is already recorded. Mods
    /// discovered on disk carry no registry id and never match.
    pub fn has_registry_mod(&self, mod_id: &str) -> bool {
        self.enabled_mods
            .iter()
            .any(|entry| entry.registry_id() == Some(mod_id))
    }

    /// Path to the instance directory under the managed root.
    pub fn dir(&self, managed_root: &Path) -> PathBuf {
        managed_root.join(&self.name)
    }

    /// Path to the `mods/` directory.
    pub fn mods_dir(&self, managed_root: &Path) -> PathBuf {
        self.dir(managed_root).join("mods")
    }

    /// Path to `mods/disabled/`.
    pub fn disabled_mods_dir(&self, managed_root: &Path) -> PathBuf {
        self.mods_dir(managed_root).join("disabled")
    }

    /// Path to the `resourcepacks/` directory.
    pub fn resource_packs_dir(&self, managed_root: &Path) -> PathBuf {
        self.dir(managed_root).join("resourcepacks")
    }
}

/// Whether `name` is a single plain path component, so that joining it onto
/// a directory names a direct child of that directory.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

fn unknown_version() -> String {
    UNKNOWN_VERSION.to_string()
}

/// `createdAt` is written as RFC 3339. Older manifests hold naive ISO-8601
/// stamps in local time, which are accepted on read.
pub(crate) mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        let naive: NaiveDateTime = raw.parse().ok()?;
        Some(
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc()),
        )
    }
}
