/**
 * ============================================================================
 * EXTERNAL BINARY MODULE
 * ============================================================================
 *
 * PURPOSE: Run the bundled helper binaries (device enumeration, camera
 * permission) and capture their output
 *
 * CONTRACT:
 * - Helpers are invoked with no arguments and a null stdin
 * - Only the exit status and stdout matter; stderr is logged at debug level
 * - Spawn failures are returned as Err so callers can fail closed
 *
 * ============================================================================
 */

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

// File names of the bundled helpers (platform executable suffix appended)
pub const DEVICES_BINARY_NAME: &str = "video-devices";
pub const PERMISSION_BINARY_NAME: &str = "camera-permission";

/**
 * A program plus arguments
 * Bundled helpers take no arguments; the builder exists so wrappers and
 * tests can point at shell commands
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalBinary {
    program: PathBuf,
    args: Vec<String>,
}

// Exit status and decoded stdout of a finished helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOutput {
    pub success: bool,
    pub stdout: String,
}

impl ExternalBinary {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /**
     * Run to completion and collect output
     * No timeout: helpers are expected to fail fast on their own
     */
    pub async fn run(&self) -> Result<BinaryOutput, String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("Failed to run {:?}: {}", self.program, e))?;

        if !output.stderr.is_empty() {
            log::debug!(
                "{:?} stderr: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        Ok(BinaryOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

// Locations of both helpers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPaths {
    pub devices: ExternalBinary,
    pub permission: ExternalBinary,
}

impl BinaryPaths {
    // Resolve both helpers inside one directory (e.g. `<resources>/binaries`)
    pub fn in_dir(dir: &Path) -> Self {
        let exe = |name: &str| dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        Self {
            devices: ExternalBinary::new(exe(DEVICES_BINARY_NAME)),
            permission: ExternalBinary::new(exe(PERMISSION_BINARY_NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_paths_in_dir() {
        let paths = BinaryPaths::in_dir(Path::new("/opt/app/binaries"));
        let devices = paths.devices.program().to_string_lossy().to_string();
        let permission = paths.permission.program().to_string_lossy().to_string();
        assert!(devices.starts_with("/opt/app/binaries"));
        assert!(devices.contains(DEVICES_BINARY_NAME));
        assert!(permission.contains(PERMISSION_BINARY_NAME));
    }

    #[tokio::test]
    async fn test_missing_binary_is_err() {
        let binary = ExternalBinary::new("/nonexistent/camera-overlay/helper");
        assert!(binary.run().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout_and_status() {
        let output = ExternalBinary::new("sh")
            .arg("-c")
            .arg("printf 'hello'; exit 3")
            .run()
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.stdout, "hello");

        let output = ExternalBinary::new("true").run().await.unwrap();
        assert!(output.success);
        assert!(output.stdout.is_empty());
    }
}
