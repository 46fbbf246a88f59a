/**
 * ============================================================================
 * CAMERA OVERLAY COMMANDS MODULE
 * ============================================================================
 *
 * PURPOSE: Tauri commands exposing the camera overlay to the frontend
 *
 * The host app's single recording session lives in CameraOverlayState,
 * managed by Tauri. Commands never fail the recording: lifecycle results are
 * returned as StartOutcome / PermissionOutcome values.
 *
 * The fatal consent outcome is handled here, at the top of the stack:
 * open the camera privacy settings, then exit the app.
 *
 * ============================================================================
 */

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tauri::{AppHandle, State};

use crate::camera::config::{self, OverlayConfig};
use crate::camera::devices::{self, DeviceRegistry};
use crate::camera::manager::OverlayCoordinator;
use crate::camera::permission;
use crate::camera::session::{OverlaySession, SessionStatus};
use crate::camera::types::{CaptureRegion, PermissionOutcome, StartOutcome};
use crate::host::surface::{TauriOverlayHost, TauriOverlaySurface};

pub struct CameraOverlayState {
    pub(crate) coordinator: OverlayCoordinator<TauriOverlayHost>,
    pub(crate) session: OverlaySession<TauriOverlaySurface>,
    pub(crate) registry: DeviceRegistry,
    pub(crate) config: Mutex<OverlayConfig>,
    pub(crate) config_path: PathBuf,
}

impl CameraOverlayState {
    fn config(&self) -> OverlayConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// Open the camera privacy settings and exit; the OS applies the change on relaunch
fn open_settings_and_exit(app: &AppHandle) {
    match permission::settings_url() {
        Some(url) => {
            if let Err(e) = tauri_plugin_opener::open_url(url, None::<&str>) {
                log::error!("Failed to open camera privacy settings: {}", e);
            }
        }
        None => log::warn!("No camera privacy settings link on this platform"),
    }

    log::warn!("Exiting so the camera permission change takes effect on next launch");
    app.exit(0);
}

// Re-enumerate cameras ("Default" first)
#[tauri::command]
pub async fn list_camera_devices(state: State<'_, CameraOverlayState>) -> Result<Vec<String>, String> {
    Ok(state.registry.refresh().await)
}

#[tauri::command]
pub async fn get_overlay_config(state: State<'_, CameraOverlayState>) -> Result<OverlayConfig, String> {
    Ok(state.config())
}

// Validate, persist and apply new overlay settings (used from the next start)
#[tauri::command]
pub async fn update_overlay_config(
    state: State<'_, CameraOverlayState>,
    new_config: OverlayConfig,
) -> Result<(), String> {
    new_config.validate(&state.registry.devices())?;

    if state.config() == new_config {
        log::info!("Overlay configuration unchanged");
        return Ok(());
    }

    config::save_config(&state.config_path, &new_config)?;
    *state.config.lock().unwrap_or_else(PoisonError::into_inner) = new_config;

    log::info!("Overlay configuration updated");
    Ok(())
}

#[tauri::command]
pub async fn get_overlay_config_schema(
    state: State<'_, CameraOverlayState>,
) -> Result<serde_json::Value, String> {
    Ok(config::config_schema(&state.registry.devices()))
}

// Permission gate when the overlay service is switched on
#[tauri::command]
pub async fn enable_camera_overlay(
    app: AppHandle,
    state: State<'_, CameraOverlayState>,
) -> Result<PermissionOutcome, String> {
    let outcome = state.coordinator.on_enable().await;
    if outcome == PermissionOutcome::OpenSettings {
        open_settings_and_exit(&app);
    }
    Ok(outcome)
}

// Called by the recording pipeline right before capture begins
#[tauri::command]
pub async fn start_camera_overlay(
    app: AppHandle,
    state: State<'_, CameraOverlayState>,
    capture_region: CaptureRegion,
    screen_id: u32,
) -> Result<StartOutcome, String> {
    let config = state.config();
    let outcome = state
        .coordinator
        .on_recording_start(&state.session, &config, capture_region, screen_id)
        .await;

    if outcome == StartOutcome::RestartRequired {
        open_settings_and_exit(&app);
    }
    Ok(outcome)
}

// Called by the recording pipeline once capture stopped
#[tauri::command]
pub async fn stop_camera_overlay(state: State<'_, CameraOverlayState>) -> Result<(), String> {
    state.coordinator.on_recording_stop(&state.session);
    Ok(())
}

#[tauri::command]
pub async fn get_camera_overlay_status(
    state: State<'_, CameraOverlayState>,
) -> Result<SessionStatus, String> {
    Ok(state.session.status())
}

/**
 * Used by the overlay page: pick the camera label to bind to
 * `requested` is the deviceName the page received with its data event, so a
 * config change after start does not switch the camera of a live overlay.
 * `labels` are the video input labels the page can see.
 */
#[tauri::command]
pub fn match_camera_device(requested: String, labels: Vec<String>) -> Option<String> {
    devices::match_device(&requested, &labels).map(str::to_string)
}
