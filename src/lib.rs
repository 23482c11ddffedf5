pub mod core;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;
    use tauri::Manager;
    use tracing_subscriber::EnvFilter;

    use crate::core::state::AppState;

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,yamim_lib=debug")),
        )
        .init();

    tracing::info!("YAMIM launcher starting...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let state = AppState::new()?;
            if let Err(e) = tauri::async_runtime::block_on(state.initialize()) {
                tracing::error!("Startup initialization failed: {}", e);
            }
            app.manage(Arc::new(state));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_instances,
            commands::get_game_dir,
            commands::update_game_dir,
            commands::create_instance,
            commands::edit_instance,
            commands::delete_instance,
            commands::search_mods,
            commands::install_mod,
            commands::get_minecraft_versions,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
