/**
 * ============================================================================
 * CAMERA OVERLAY CONFIG MODULE
 * ============================================================================
 *
 * PURPOSE: User-facing overlay settings, their validation and persistence
 *
 * FUNCTIONALITY:
 * - One schema with two presets:
 *   - classic: raw width/height, CSS border radius, hover opacity
 *   - tiered:  named size tier + shape, mapped to pixels/radius by table
 * - Validation at load/update time (opacity range, positive sizes, device)
 * - Load/save as JSON, defaults when no file exists
 * - Declarative schema for the host's settings UI
 *
 * ============================================================================
 */

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::camera::devices::DEFAULT_DEVICE;
use crate::camera::types::{OverlayMessage, OverlaySize, StyleParams};

pub const CONFIG_FILE_NAME: &str = "overlay_config.json";

pub const CONFIG_DESCRIPTION: &str = "Shows the selected camera in a window at the bottom-right corner of the recording.
Its hover opacity, shape and size can be adjusted.";

// Named overlay sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

// Named overlay shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Rounded,
    Square,
}

// Tier -> square edge length in logical pixels
const SIZE_TIERS: [(SizeTier, f64); 3] = [
    (SizeTier::Small, 128.0),
    (SizeTier::Medium, 192.0),
    (SizeTier::Large, 256.0),
];

// Shape -> CSS border radius
const SHAPES: [(Shape, &str); 3] = [
    (Shape::Circle, "50%"),
    (Shape::Rounded, "16px"),
    (Shape::Square, "0"),
];

impl SizeTier {
    pub fn pixels(self) -> f64 {
        SIZE_TIERS
            .iter()
            .find(|(tier, _)| *tier == self)
            .map(|(_, px)| *px)
            .unwrap_or(SIZE_TIERS[0].1)
    }
}

impl Shape {
    pub fn border_radius(self) -> &'static str {
        SHAPES
            .iter()
            .find(|(shape, _)| *shape == self)
            .map(|(_, radius)| *radius)
            .unwrap_or(SHAPES[0].1)
    }
}

/**
 * Overlay sizing and styling preset
 * Stored with a "preset" tag so both variants share one file format
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum OverlayLayout {
    Classic {
        width: f64,
        height: f64,
        border_radius: String,
        #[serde(default = "default_hover_opacity")]
        hover_opacity: f64,
    },
    Tiered {
        size: SizeTier,
        shape: Shape,
        #[serde(default = "default_hover_opacity")]
        hover_opacity: f64,
    },
}

impl Default for OverlayLayout {
    fn default() -> Self {
        OverlayLayout::Classic {
            width: 128.0,
            height: 128.0,
            border_radius: "50%".to_string(),
            hover_opacity: default_hover_opacity(),
        }
    }
}

impl OverlayLayout {
    // Starting point when the user switches to the tiered preset
    pub fn tiered_default() -> Self {
        OverlayLayout::Tiered {
            size: SizeTier::Medium,
            shape: Shape::Circle,
            hover_opacity: default_hover_opacity(),
        }
    }

    pub fn hover_opacity(&self) -> f64 {
        match self {
            OverlayLayout::Classic { hover_opacity, .. } => *hover_opacity,
            OverlayLayout::Tiered { hover_opacity, .. } => *hover_opacity,
        }
    }
}

fn default_hover_opacity() -> f64 {
    0.6
}

fn default_device_name() -> String {
    DEFAULT_DEVICE.to_string()
}

// Persisted overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    // Camera to show; one of the enumerated devices or "Default"
    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default)]
    pub layout: OverlayLayout,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            layout: OverlayLayout::default(),
        }
    }
}

impl OverlayConfig {
    // Concrete window dimensions for this config
    pub fn overlay_size(&self) -> OverlaySize {
        match &self.layout {
            OverlayLayout::Classic { width, height, .. } => OverlaySize {
                width: *width,
                height: *height,
            },
            OverlayLayout::Tiered { size, .. } => OverlaySize {
                width: size.pixels(),
                height: size.pixels(),
            },
        }
    }

    pub fn style_params(&self) -> StyleParams {
        match &self.layout {
            OverlayLayout::Classic {
                border_radius,
                hover_opacity,
                ..
            } => StyleParams {
                border_radius: border_radius.clone(),
                hover_opacity: *hover_opacity,
                size_tier: None,
            },
            OverlayLayout::Tiered {
                size,
                shape,
                hover_opacity,
            } => StyleParams {
                border_radius: shape.border_radius().to_string(),
                hover_opacity: *hover_opacity,
                size_tier: Some(*size),
            },
        }
    }

    // Payload for the overlay surface
    pub fn message(&self) -> OverlayMessage {
        OverlayMessage {
            device_name: self.device_name.clone(),
            style_params: self.style_params(),
        }
    }

    /**
     * Validate against the current device list
     * `devices` is the registry list; "Default" is always accepted
     */
    pub fn validate(&self, devices: &[String]) -> Result<(), ConfigError> {
        self.validate_layout()?;

        if self.device_name != DEFAULT_DEVICE && !devices.iter().any(|d| *d == self.device_name) {
            return Err(ConfigError::UnknownDevice(self.device_name.clone()));
        }

        Ok(())
    }

    fn validate_layout(&self) -> Result<(), ConfigError> {
        let opacity = self.layout.hover_opacity();
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::InvalidOpacity(opacity));
        }

        if let OverlayLayout::Classic {
            width,
            height,
            border_radius,
            ..
        } = &self.layout
        {
            for (field, value) in [("width", *width), ("height", *height)] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::InvalidDimension { field, value });
                }
            }
            if border_radius.trim().is_empty() {
                return Err(ConfigError::EmptyBorderRadius);
            }
        }

        Ok(())
    }
}

// Configuration problems found at load/update time
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidOpacity(f64),
    InvalidDimension { field: &'static str, value: f64 },
    EmptyBorderRadius,
    UnknownDevice(String),
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidOpacity(value) => {
                write!(f, "Hover opacity must be between 0 and 1 (got {})", value)
            }
            ConfigError::InvalidDimension { field, value } => {
                write!(f, "Overlay {} must be a positive number (got {})", field, value)
            }
            ConfigError::EmptyBorderRadius => write!(f, "Border radius must not be empty"),
            ConfigError::UnknownDevice(name) => write!(f, "Unknown camera device '{}'", name),
            ConfigError::Io(message) => write!(f, "Config I/O error: {}", message),
            ConfigError::Parse(message) => write!(f, "Failed to parse config: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for String {
    fn from(error: ConfigError) -> Self {
        error.to_string()
    }
}

// Default location: <config dir>/camera-overlay/overlay_config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("camera-overlay").join(CONFIG_FILE_NAME))
}

/**
 * Pick the config file location
 * `app_config_dir` is the host's per-app directory when it has one;
 * otherwise the user config directory is used
 */
pub fn resolve_config_path(app_config_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match app_config_dir {
        Some(dir) => Ok(dir.join(CONFIG_FILE_NAME)),
        None => default_config_path()
            .ok_or_else(|| ConfigError::Io("No config directory available".to_string())),
    }
}

/**
 * Load configuration from disk
 * Missing file -> defaults. A device that is no longer listed is reset to
 * "Default" with a warning; other validation failures are errors.
 */
pub fn load_config(path: &Path, devices: &[String]) -> Result<OverlayConfig, ConfigError> {
    if !path.exists() {
        log::info!("No overlay config found, using defaults");
        return Ok(OverlayConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let mut config: OverlayConfig =
        serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if let Err(ConfigError::UnknownDevice(name)) = config.validate(devices) {
        log::warn!("Configured camera '{}' not found, falling back to {}", name, DEFAULT_DEVICE);
        config.device_name = default_device_name();
    }
    config.validate(devices)?;

    log::info!("Loaded overlay config from {:?}", path);
    Ok(config)
}

// Save configuration to disk
pub fn save_config(path: &Path, config: &OverlayConfig) -> Result<(), ConfigError> {
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Io(format!("Failed to create config dir: {}", e)))?;
    }

    let contents =
        serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?;

    std::fs::write(path, contents)
        .map_err(|e| ConfigError::Io(format!("Failed to write config: {}", e)))?;

    log::info!("Saved overlay config to {:?}", path);
    Ok(())
}

/**
 * Declarative option schema for the host's settings UI
 * Mirrors the stored shape: layout options live under "layout", keyed by the
 * "preset" tag. Device choices come from the registry at load time.
 */
pub fn config_schema(devices: &[String]) -> serde_json::Value {
    let classic = OverlayLayout::default();
    let (default_width, default_height, default_radius) = match &classic {
        OverlayLayout::Classic {
            width,
            height,
            border_radius,
            ..
        } => (*width, *height, border_radius.clone()),
        OverlayLayout::Tiered { .. } => (128.0, 128.0, "50%".to_string()),
    };

    json!({
        "description": CONFIG_DESCRIPTION,
        "properties": {
            "deviceName": {
                "title": "Device",
                "description": "Which camera to display.",
                "type": "string",
                "enum": devices,
                "required": true,
                "default": DEFAULT_DEVICE
            },
            "layout": {
                "title": "Layout",
                "type": "object",
                "required": true,
                "properties": {
                    "preset": {
                        "title": "Preset",
                        "description": "Raw pixel sizing (classic) or named size and shape (tiered).",
                        "type": "string",
                        "enum": ["classic", "tiered"],
                        "required": true,
                        "default": "classic"
                    },
                    "hoverOpacity": {
                        "title": "Hover Opacity",
                        "description": "Opacity of the window when moused over.",
                        "type": "number",
                        "minimum": 0,
                        "maximum": 1,
                        "default": classic.hover_opacity()
                    },
                    "width": {
                        "title": "Width",
                        "description": "Width of the window (classic).",
                        "type": "number",
                        "minimum": 0,
                        "default": default_width
                    },
                    "height": {
                        "title": "Height",
                        "description": "Height of the window (classic).",
                        "type": "number",
                        "minimum": 0,
                        "default": default_height
                    },
                    "borderRadius": {
                        "title": "Border Radius",
                        "description": "Any valid `border-radius` value, like `10px` or `50%` (classic).",
                        "type": "string",
                        "default": default_radius
                    },
                    "size": {
                        "title": "Size",
                        "description": "Window size (tiered).",
                        "type": "string",
                        "enum": ["small", "medium", "large"],
                        "default": "medium"
                    },
                    "shape": {
                        "title": "Shape",
                        "description": "Window shape (tiered).",
                        "type": "string",
                        "enum": ["circle", "rounded", "square"],
                        "default": "circle"
                    }
                }
            }
        }
    })
}
