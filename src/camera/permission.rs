/**
 * ============================================================================
 * PERMISSION GATE MODULE
 * ============================================================================
 *
 * PURPOSE: Verify OS-level camera permission before an overlay is shown
 *
 * FLOW:
 * 1. Ask the permission helper; only an exact "true" on success counts
 * 2. If not granted, show the consent prompt (Open Settings / Cancel)
 * 3. "Open Settings" is the fatal consent outcome: the caller opens the
 *    privacy settings and terminates the host, since the OS only applies the
 *    change to a freshly launched process
 *
 * The gate itself never opens settings or exits; it only reports the outcome.
 *
 * ============================================================================
 */

use std::future::Future;

use crate::camera::binary::{BinaryOutput, ExternalBinary};
use crate::camera::types::{ConsentChoice, PermissionOutcome};

// Helper stdout meaning "granted"
pub const GRANTED_TOKEN: &str = "true";

pub const CONSENT_TITLE: &str = "Camera access required";
pub const CONSENT_MESSAGE: &str = "The camera overlay cannot access the camera. \
You can grant access in the system privacy settings. \
Afterwards, relaunch the app for the change to take effect.";
pub const OPEN_SETTINGS_LABEL: &str = "Open Settings";
pub const CANCEL_LABEL: &str = "Cancel";

// Queries current camera permission
pub trait PermissionProbe: Send + Sync {
    fn check_permission(&self) -> impl Future<Output = bool> + Send;
}

// Blocking consent prompt shown after a denial
pub trait ConsentPrompt: Send + Sync {
    fn ask_consent(&self) -> impl Future<Output = ConsentChoice> + Send;
}

impl PermissionProbe for ExternalBinary {
    fn check_permission(&self) -> impl Future<Output = bool> + Send {
        check_permission(self)
    }
}

/**
 * Run the permission helper, failing closed
 * Spawn errors and unexpected output both count as "not granted"
 */
pub async fn check_permission(binary: &ExternalBinary) -> bool {
    match binary.run().await {
        Ok(output) => {
            let granted = is_granted(&output);
            if !granted {
                log::info!(
                    "Camera permission not granted (success={}, stdout={:?})",
                    output.success,
                    output.stdout
                );
            }
            granted
        }
        Err(e) => {
            log::warn!("Camera permission check failed: {}", e);
            false
        }
    }
}

/**
 * Exact token match on a successful exit
 * A single trailing line terminator is what the helper's print appends and
 * is not part of the token; anything else is a denial
 */
pub fn is_granted(output: &BinaryOutput) -> bool {
    let stdout = output.stdout.as_str();
    let token = stdout
        .strip_suffix("\r\n")
        .or_else(|| stdout.strip_suffix('\n'))
        .unwrap_or(stdout);
    output.success && token == GRANTED_TOKEN
}

/**
 * Check, then prompt on denial
 * Returns Granted without side effects when permission is already present
 */
pub async fn ensure_permission<G>(gate: &G) -> PermissionOutcome
where
    G: PermissionProbe + ConsentPrompt + ?Sized,
{
    if gate.check_permission().await {
        return PermissionOutcome::Granted;
    }

    match gate.ask_consent().await {
        ConsentChoice::OpenSettings => {
            log::warn!("User chose to grant camera access in settings, host restart required");
            PermissionOutcome::OpenSettings
        }
        ConsentChoice::Cancel => {
            log::info!("User declined camera access prompt");
            PermissionOutcome::Denied
        }
    }
}

// Deep link to the camera privacy pane, if the platform has one
pub fn settings_url() -> Option<&'static str> {
    #[cfg(target_os = "macos")]
    {
        Some("x-apple.systempreferences:com.apple.preference.security?Privacy_Camera")
    }
    #[cfg(target_os = "windows")]
    {
        Some("ms-settings:privacy-webcam")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        None
    }
}
