/**
 * ============================================================================
 * TAURI HOST MODULE
 * ============================================================================
 *
 * PURPOSE: Wire the camera overlay into a Tauri recording app
 *
 * SUBMODULES:
 * - surface: Tauri implementations of the overlay host seams
 * - commands: Frontend commands and the managed CameraOverlayState
 *
 * USAGE (host app lib.rs):
 *   app_lib::host::with_plugins(tauri::Builder::default())
 *       .invoke_handler(tauri::generate_handler![
 *           app_lib::host::commands::start_camera_overlay,
 *           app_lib::host::commands::stop_camera_overlay,
 *           ...
 *       ])
 *       .setup(|app| {
 *           app_lib::host::setup(app.handle(), app_lib::host::HostOptions::default())?;
 *           Ok(())
 *       })
 *
 * ============================================================================
 */

pub mod commands;
pub mod surface;

use std::path::PathBuf;
use std::sync::Mutex;
use tauri::{AppHandle, Manager, Wry};

use crate::camera::binary::BinaryPaths;
use crate::camera::config::{self, OverlayConfig};
use crate::camera::devices::DeviceRegistry;
use crate::camera::manager::{CoordinatorConfig, OverlayCoordinator};
use crate::camera::session::OverlaySession;
use crate::host::commands::CameraOverlayState;
use crate::host::surface::TauriOverlayHost;

#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    // Directory with the helper binaries; defaults to <resources>/binaries
    pub binaries_dir: Option<PathBuf>,
    pub coordinator: CoordinatorConfig,
}

/**
 * Register the plugins the overlay relies on
 * Logging is only installed for debug builds, as in the app shell
 */
pub fn with_plugins(builder: tauri::Builder<Wry>) -> tauri::Builder<Wry> {
    let builder = builder
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init());

    if cfg!(debug_assertions) {
        builder.plugin(
            tauri_plugin_log::Builder::default()
                .level(log::LevelFilter::Warn)
                .level_for("app_lib::camera", log::LevelFilter::Info)
                .level_for("app_lib::host", log::LevelFilter::Info)
                .build(),
        )
    } else {
        builder
    }
}

/**
 * Build and manage the overlay state
 * 1. Resolve helper binaries
 * 2. Enumerate cameras (the list validates the stored device name)
 * 3. Load overlay config, falling back to defaults
 */
pub fn setup(app: &AppHandle, options: HostOptions) -> Result<(), String> {
    let binaries_dir = match options.binaries_dir {
        Some(dir) => dir,
        None => app
            .path()
            .resource_dir()
            .map_err(|e| format!("Failed to get resource directory: {}", e))?
            .join("binaries"),
    };
    log::info!("Camera helper binaries: {:?}", binaries_dir);
    let binaries = BinaryPaths::in_dir(&binaries_dir);

    let registry = DeviceRegistry::new(binaries.devices.clone());
    let devices = tauri::async_runtime::block_on(registry.refresh());

    let app_config_dir = match app.path().app_config_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
            log::warn!("Failed to get app config directory, using user config dir: {}", e);
            None
        }
    };
    let config_path = config::resolve_config_path(app_config_dir)?;

    let overlay_config = config::load_config(&config_path, &devices).unwrap_or_else(|e| {
        log::warn!("Failed to load overlay config, using defaults: {}", e);
        OverlayConfig::default()
    });

    let host = TauriOverlayHost::new(app.clone(), binaries);
    app.manage(CameraOverlayState {
        coordinator: OverlayCoordinator::new(host, options.coordinator),
        session: OverlaySession::new(),
        registry,
        config: Mutex::new(overlay_config),
        config_path,
    });

    log::info!("Camera overlay initialized");
    Ok(())
}
