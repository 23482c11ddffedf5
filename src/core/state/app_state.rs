use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::instance::InstanceManager;
use crate::core::manifest::ManifestStore;
use crate::core::mods::{ModInstaller, ModRegistry, ModrinthClient, MODRINTH_API_BASE};
use crate::core::version::{VersionManifest, VERSION_MANIFEST_URL};

const APP_DIR_NAME: &str = "YAMIM";
const DATA_DIR_ENV: &str = "YAMIM_DATA_DIR";
const SETTINGS_FILE: &str = "launcher_settings.json";
const MANIFEST_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub registry_base_url: String,
    pub version_manifest_url: String,
    pub search_limit: u32,
    /// Overrides `<gameDir>/launcher_profiles.json` as the source of the
    /// most recently played instance.
    pub launcher_profiles_path: Option<PathBuf>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            registry_base_url: MODRINTH_API_BASE.to_string(),
            version_manifest_url: VERSION_MANIFEST_URL.to_string(),
            search_limit: 5,
            launcher_profiles_path: None,
        }
    }
}

impl LauncherSettings {
    /// Settings from `<data_dir>/launcher_settings.json`, defaults when the
    /// file is missing or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring invalid settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(data_dir).map_err(|source| LauncherError::io(data_dir, source))?;
        let path = data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| LauncherError::io(&path, source))
    }
}

pub struct AppState {
    pub data_dir: PathBuf,
    pub settings: LauncherSettings,
    pub http_client: Client,
    pub store: Arc<ManifestStore>,
    pub instance_manager: InstanceManager,
    pub mod_installer: ModInstaller,
}

impl AppState {
    /// State rooted at the default data dir, talking to the configured registry.
    pub fn new() -> LauncherResult<Self> {
        let data_dir = default_data_dir();
        let settings = LauncherSettings::load(&data_dir);
        let http_client = build_http_client()?;
        let registry = Arc::new(ModrinthClient::new(
            http_client.clone(),
            &settings.registry_base_url,
            settings.search_limit,
        ));
        Ok(Self::from_parts(data_dir, settings, http_client, registry))
    }

    pub fn from_parts(
        data_dir: PathBuf,
        settings: LauncherSettings,
        http_client: Client,
        registry: Arc<dyn ModRegistry>,
    ) -> Self {
        let store = Arc::new(ManifestStore::new(data_dir.join(MANIFEST_FILE)));
        let instance_manager =
            InstanceManager::new(store.clone(), settings.launcher_profiles_path.clone());
        let mod_installer = ModInstaller::new(store.clone(), registry);

        Self {
            data_dir,
            settings,
            http_client,
            store,
            instance_manager,
            mod_installer,
        }
    }

    /// Create the manifest and settings files if needed and settle the game
    /// directory.
    pub async fn initialize(&self) -> LauncherResult<()> {
        self.initialize_with(default_game_dir()).await
    }

    async fn initialize_with(&self, fallback_game_dir: Option<PathBuf>) -> LauncherResult<()> {
        self.store.ensure_exists().await?;
        if !self.data_dir.join(SETTINGS_FILE).exists() {
            info!("Writing default settings to {:?}", self.data_dir);
            self.settings.save(&self.data_dir)?;
        }
        match self
            .instance_manager
            .initialize_game_dir(fallback_game_dir)
            .await?
        {
            Some(dir) => info!("Game directory: {:?}", dir),
            None => warn!("No game directory configured"),
        }
        Ok(())
    }

    pub async fn minecraft_versions(&self) -> LauncherResult<Vec<String>> {
        let manifest =
            VersionManifest::fetch(&self.http_client, &self.settings.version_manifest_url).await?;
        Ok(manifest.release_ids())
    }
}

pub fn default_data_dir() -> PathBuf {
    resolve_data_dir(std::env::var_os(DATA_DIR_ENV))
}

fn resolve_data_dir(override_dir: Option<OsString>) -> PathBuf {
    match override_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME),
    }
}

/// Where the official launcher keeps its game directory on this OS.
pub fn default_game_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_dir().map(|dir| dir.join(".minecraft"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|dir| dir.join("minecraft"))
    } else {
        dirs::home_dir().map(|dir| dir.join(".minecraft"))
    }
}
