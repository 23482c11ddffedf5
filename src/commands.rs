use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::core::error::LauncherError;
use crate::core::instance::{GameDirStatus, Instance, InstanceEdit};
use crate::core::mods::{InstallOutcome, SearchHit};
use crate::core::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInstancePayload {
    pub name: String,
    pub version: String,
}

#[tauri::command]
pub async fn list_instances(
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<Vec<Instance>, LauncherError> {
    state.instance_manager.list().await
}

#[tauri::command]
pub async fn get_game_dir(
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<Option<PathBuf>, LauncherError> {
    Ok(state.instance_manager.game_dir().await)
}

#[tauri::command]
pub async fn update_game_dir(
    state: tauri::State<'_, Arc<AppState>>,
    game_dir: String,
) -> Result<GameDirStatus, LauncherError> {
    state.instance_manager.set_game_dir(&game_dir).await
}

#[tauri::command]
pub async fn create_instance(
    state: tauri::State<'_, Arc<AppState>>,
    payload: CreateInstancePayload,
) -> Result<Instance, LauncherError> {
    state
        .instance_manager
        .create(&payload.name, &payload.version)
        .await
}

#[tauri::command]
pub async fn edit_instance(
    state: tauri::State<'_, Arc<AppState>>,
    name: String,
    edit: InstanceEdit,
) -> Result<Instance, LauncherError> {
    state.instance_manager.edit(&name, edit).await
}

#[tauri::command]
pub async fn delete_instance(
    state: tauri::State<'_, Arc<AppState>>,
    name: String,
) -> Result<(), LauncherError> {
    state.instance_manager.delete(&name).await
}

#[tauri::command]
pub async fn search_mods(
    state: tauri::State<'_, Arc<AppState>>,
    query: String,
) -> Result<Vec<SearchHit>, LauncherError> {
    state.mod_installer.search(&query).await
}

#[tauri::command]
pub async fn install_mod(
    state: tauri::State<'_, Arc<AppState>>,
    mod_id: String,
    instance_name: String,
) -> Result<InstallOutcome, LauncherError> {
    state.mod_installer.install(&mod_id, &instance_name).await
}

#[tauri::command]
pub async fn get_minecraft_versions(
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<Vec<String>, LauncherError> {
    state.minecraft_versions().await
}
