/**
 * ============================================================================
 * CAMERA OVERLAY TYPES MODULE
 * ============================================================================
 *
 * PURPOSE: Data structures shared across the camera overlay system
 *
 * TYPES DEFINED:
 * - CaptureRegion: Recorded area in capture-space (top-left origin)
 * - ScreenBounds: Bounds of the display hosting the capture region
 * - OverlaySize / OverlayRect: Resolved overlay dimensions and placement
 * - StyleParams / OverlayMessage: Payload delivered to the overlay surface
 * - OverlayPhase: Lifecycle state of a recording session's overlay
 * - StartOutcome / PermissionOutcome / ConsentChoice: Lifecycle results
 *
 * ============================================================================
 */

use serde::{Deserialize, Serialize};

use crate::camera::config::SizeTier;

/**
 * Area of the screen selected for recording
 * Coordinates are in capture-space: y grows downward from the top of the frame
 */
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/**
 * Bounds of a physical display in screen-space
 * A missing display is represented by `ScreenBounds::default()` (all zero)
 */
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// Concrete overlay dimensions resolved from config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlaySize {
    pub width: f64,
    pub height: f64,
}

/**
 * Absolute screen-space rectangle of the overlay window
 * Computed fresh on every recording start, never persisted
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
impl OverlayRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

// Visual styling applied by the overlay surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleParams {
    // Any CSS border-radius value, e.g. "50%" or "12px"
    pub border_radius: String,

    // Opacity applied while the pointer hovers the overlay (0.0 - 1.0)
    pub hover_opacity: f64,

    // Present when the size came from a named tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_tier: Option<SizeTier>,
}

/**
 * Single message sent to the overlay surface once its content has loaded
 * The surface answers with one "mounted" signal after attempting device binding
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayMessage {
    pub device_name: String,
    pub style_params: StyleParams,
}

/**
 * Lifecycle phase of a session's overlay
 * Success path: Idle -> PermissionPending -> Placing -> Spawning -> AwaitingMount -> Mounted
 * Rejection path: Idle -> PermissionPending -> Denied -> Idle
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayPhase {
    #[default]
    Idle,
    PermissionPending,
    Placing,
    Spawning,
    AwaitingMount,
    Mounted,
    Denied,
}

/**
 * Result of a recording-start request
 * None of these are failures of the recording itself
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StartOutcome {
    // Surface acknowledged the mount
    Mounted,
    // No acknowledgment within the mount timeout; surface stays up
    TimedOut,
    // Recording stopped while the start sequence was in flight
    Cancelled,
    // Permission missing and the user dismissed the consent prompt
    PermissionDenied,
    // User chose to open OS settings; the host must restart to pick up the change
    RestartRequired,
    // Surface could not be created; recording continues without overlay
    SpawnFailed(String),
}

// Outcome of the permission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    // Fatal consent outcome: open OS privacy settings, then terminate the host
    OpenSettings,
}

impl PermissionOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionOutcome::Granted)
    }
}

// Button picked in the consent prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentChoice {
    OpenSettings,
    Cancel,
}
