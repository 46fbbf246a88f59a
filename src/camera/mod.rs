/**
 * ============================================================================
 * CAMERA OVERLAY MODULE
 * ============================================================================
 *
 * PURPOSE: Live camera preview window on top of a screen recording
 *
 * SUBMODULES:
 * - binary: Runs the bundled helper binaries
 * - devices: Camera enumeration ("Default" first) and overlay-side matching
 * - permission: Camera permission gate and consent outcome
 * - placement: Overlay rectangle for a capture region
 * - config: Overlay settings, presets, validation, persistence, schema
 * - surface: Host seams (displays, overlay window factory, mount signal)
 * - session: Per-recording-session overlay state
 * - manager: Start/stop lifecycle coordinator
 * - types: Shared data structures
 *
 * ARCHITECTURE:
 * The recording session owns an OverlaySession and calls the coordinator
 * on start/stop. The coordinator reaches the outside world only through the
 * OverlayHost traits, implemented for Tauri in `crate::host`.
 *
 * ============================================================================
 */

pub mod binary;
pub mod config;
pub mod devices;
pub mod manager;
pub mod permission;
pub mod placement;
pub mod session;
pub mod surface;
pub mod types;
