pub mod camera;

#[cfg(feature = "tauri-host")]
pub mod host;

pub use camera::config::OverlayConfig;
pub use camera::manager::{CoordinatorConfig, OverlayCoordinator, OverlayHost};
pub use camera::session::{OverlaySession, SessionStatus};
pub use camera::types::{CaptureRegion, OverlayRect, PermissionOutcome, ScreenBounds, StartOutcome};
