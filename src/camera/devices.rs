/**
 * ============================================================================
 * DEVICE REGISTRY MODULE
 * ============================================================================
 *
 * PURPOSE: Enumerate camera devices through the bundled helper binary
 *
 * BEHAVIOR:
 * - The list always starts with the synthetic "Default" entry
 * - Any helper failure (missing, non-zero exit, no output) yields ["Default"]
 * - The list is advisory: it feeds the device selector and is not checked
 *   again at recording time; the overlay falls back via `match_device`
 *
 * ============================================================================
 */

use std::sync::{Mutex, PoisonError};

use crate::camera::binary::ExternalBinary;

pub const DEFAULT_DEVICE: &str = "Default";

// Enumerate devices, never failing
pub async fn list_devices(binary: &ExternalBinary) -> Vec<String> {
    match binary.run().await {
        Ok(output) if output.success => parse_device_list(&output.stdout),
        Ok(_) => {
            log::warn!("Device enumeration exited with failure, using default device only");
            vec![DEFAULT_DEVICE.to_string()]
        }
        Err(e) => {
            log::warn!("Device enumeration unavailable: {}", e);
            vec![DEFAULT_DEVICE.to_string()]
        }
    }
}

/**
 * Build the selectable list from helper stdout
 * One name per line in helper order, blank lines dropped
 */
pub fn parse_device_list(stdout: &str) -> Vec<String> {
    let mut devices = vec![DEFAULT_DEVICE.to_string()];
    devices.extend(
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    );
    devices
}

/**
 * Pick the camera the overlay should bind to from the labels it can see
 * "Default" (or empty) selects the first label; otherwise the first label
 * containing the requested name; otherwise the first label
 */
pub fn match_device<'a>(requested: &str, labels: &'a [String]) -> Option<&'a str> {
    let first = labels.first()?;

    if requested.is_empty() || requested == DEFAULT_DEVICE {
        return Some(first.as_str());
    }

    let matched = labels
        .iter()
        .find(|label| label.contains(requested))
        .unwrap_or(first);
    Some(matched.as_str())
}

/**
 * Last known device list
 * Populated at load time and on explicit refresh, read by config validation
 * and the schema
 */
#[derive(Debug)]
pub struct DeviceRegistry {
    binary: ExternalBinary,
    devices: Mutex<Vec<String>>,
}

impl DeviceRegistry {
    pub fn new(binary: ExternalBinary) -> Self {
        Self {
            binary,
            devices: Mutex::new(vec![DEFAULT_DEVICE.to_string()]),
        }
    }

    // Re-run the helper and replace the cached list
    pub async fn refresh(&self) -> Vec<String> {
        let devices = list_devices(&self.binary).await;
        log::info!("Found {} camera device(s)", devices.len() - 1);
        *self.devices.lock().unwrap_or_else(PoisonError::into_inner) = devices.clone();
        devices
    }

    pub fn devices(&self) -> Vec<String> {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == DEFAULT_DEVICE
            || self
                .devices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .any(|device| device == name)
    }
}
