/**
 * ============================================================================
 * TAURI OVERLAY HOST MODULE
 * ============================================================================
 *
 * PURPOSE: Implement the coordinator's host seams with Tauri
 *
 * - Permission: bundled permission helper
 * - Consent: native warning dialog (tauri-plugin-dialog)
 * - Displays: `available_monitors()` indexed by screen id, logical units
 * - Surface: frameless transparent webview window loading the overlay page
 *
 * EVENTS:
 * - DATA_EVENT (host -> page): OverlayMessage, emitted once the page finished
 *   loading
 * - MOUNTED_EVENT (page -> host): emitted once after the page attempted to
 *   bind the camera stream, whether or not that worked
 *
 * ============================================================================
 */

use std::future::Future;
use tauri::webview::PageLoadEvent;
use tauri::{
    AppHandle, Emitter, EventId, Listener, WebviewUrl, WebviewWindow, WebviewWindowBuilder,
};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::camera::binary::BinaryPaths;
use crate::camera::permission::{
    self, CANCEL_LABEL, CONSENT_MESSAGE, CONSENT_TITLE, ConsentPrompt, OPEN_SETTINGS_LABEL,
    PermissionProbe,
};
use crate::camera::surface::{
    DisplayLookup, MountSignal, OverlaySurface, ScreenId, SurfaceFactory, SurfaceSpec,
};
use crate::camera::types::{ConsentChoice, ScreenBounds};

// Overlay page, relative to the host app's frontend dist
pub const OVERLAY_PAGE: &str = "camera/overlay.html";

pub const DATA_EVENT: &str = "camera-overlay://data";
pub const MOUNTED_EVENT: &str = "camera-overlay://mounted";

pub struct TauriOverlayHost {
    app: AppHandle,
    binaries: BinaryPaths,
}

impl TauriOverlayHost {
    pub fn new(app: AppHandle, binaries: BinaryPaths) -> Self {
        Self { app, binaries }
    }
}

impl PermissionProbe for TauriOverlayHost {
    fn check_permission(&self) -> impl Future<Output = bool> + Send {
        permission::check_permission(&self.binaries.permission)
    }
}

impl ConsentPrompt for TauriOverlayHost {
    async fn ask_consent(&self) -> ConsentChoice {
        let (tx, rx) = oneshot::channel();

        self.app
            .dialog()
            .message(CONSENT_MESSAGE)
            .title(CONSENT_TITLE)
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::OkCancelCustom(
                OPEN_SETTINGS_LABEL.to_string(),
                CANCEL_LABEL.to_string(),
            ))
            .show(move |open_settings| {
                let _ = tx.send(open_settings);
            });

        match rx.await {
            Ok(true) => ConsentChoice::OpenSettings,
            Ok(false) => ConsentChoice::Cancel,
            Err(_) => {
                log::warn!("Consent dialog closed without an answer");
                ConsentChoice::Cancel
            }
        }
    }
}

impl DisplayLookup for TauriOverlayHost {
    fn screen_bounds(&self, screen_id: ScreenId) -> Option<ScreenBounds> {
        let monitors = match self.app.available_monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                log::warn!("Failed to list monitors: {}", e);
                return None;
            }
        };

        let monitor = monitors.get(screen_id as usize)?;
        let scale = monitor.scale_factor();
        let position = monitor.position().to_logical::<f64>(scale);
        let size = monitor.size().to_logical::<f64>(scale);

        Some(ScreenBounds {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }
}

impl SurfaceFactory for TauriOverlayHost {
    type Surface = TauriOverlaySurface;

    fn spawn_surface(&self, spec: SurfaceSpec, mount: MountSignal) -> Result<TauriOverlaySurface, String> {
        let label = format!("camera-overlay-{}", Uuid::new_v4().simple());

        // Subscribe before the page can possibly answer
        let listener = self.app.listen_any(MOUNTED_EVENT, move |_event| {
            mount.notify();
        });

        let traits = spec.traits;
        let message = spec.message;
        let window = WebviewWindowBuilder::new(&self.app, &label, WebviewUrl::App(OVERLAY_PAGE.into()))
            .title("Camera")
            .position(spec.rect.x, spec.rect.y)
            .inner_size(spec.rect.width, spec.rect.height)
            .closable(traits.closable)
            .minimizable(traits.minimizable)
            .maximizable(traits.maximizable)
            .always_on_top(traits.always_on_top)
            .decorations(traits.decorations)
            .transparent(traits.transparent)
            .shadow(traits.shadow)
            .skip_taskbar(traits.skip_taskbar)
            .resizable(false)
            .focused(false)
            .on_page_load(move |window, payload| {
                if matches!(payload.event(), PageLoadEvent::Finished) {
                    if let Err(e) = window.emit_to(window.label(), DATA_EVENT, &message) {
                        log::error!("Failed to send overlay data: {}", e);
                    }
                }
            })
            .build();

        let window = match window {
            Ok(window) => window,
            Err(e) => {
                self.app.unlisten(listener);
                return Err(format!("Failed to create camera overlay window: {}", e));
            }
        };

        if traits.click_through {
            if let Err(e) = window.set_ignore_cursor_events(true) {
                log::warn!("Failed to make camera overlay click-through: {}", e);
            }
        }

        log::info!(
            "Camera overlay window '{}' at ({:.0}, {:.0}) {}x{}",
            label,
            spec.rect.x,
            spec.rect.y,
            spec.rect.width,
            spec.rect.height
        );

        Ok(TauriOverlaySurface {
            app: self.app.clone(),
            window,
            listener,
        })
    }
}

pub struct TauriOverlaySurface {
    app: AppHandle,
    window: WebviewWindow,
    listener: EventId,
}

impl OverlaySurface for TauriOverlaySurface {
    fn destroy(&mut self) {
        self.app.unlisten(self.listener);
        if let Err(e) = self.window.destroy() {
            log::debug!("Camera overlay window already gone: {}", e);
        }
    }
}
