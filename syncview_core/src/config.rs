/// Viewer configuration and appearance values

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::error::{Error, Result};

// ============================================================================
// Color
// ============================================================================

/// RGB colour, parsed from `#rrggbb` strings as used by colour pickers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(text: &str) -> Result<Self> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(text.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(text.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Normalized `[r, g, b]` in 0..1
    pub fn to_linear_rgb(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        // #0b0e12, the pane background of the viewer chrome
        Color::rgb(0x0b, 0x0e, 0x12)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// RemoteConfig
// ============================================================================

/// Request policy for pull-based remote panes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteConfig {
    /// In-flight requests older than this are abandoned. `None` waits forever.
    pub request_timeout_ms: Option<u64>,
    /// Re-request once with the freshest pose when poses arrived while a
    /// request was in flight. Off by default: such poses are dropped.
    pub coalesce_pending: bool,
    /// Frame width requested at full quality
    pub frame_width: u32,
    /// Frame height requested at full quality
    pub frame_height: u32,
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: Some(10_000),
            coalesce_pending: false,
            frame_width: 960,
            frame_height: 540,
        }
    }
}

// ============================================================================
// ViewerConfig
// ============================================================================

/// Viewer configuration
///
/// Every field has a default, so a JSON file only needs the overrides:
///
/// ```
/// use syncview_core::syncview::ViewerConfig;
///
/// let config = ViewerConfig::from_json_str(r#"{ "initialDriver": "cloud" }"#).unwrap();
/// assert_eq!(config.initial_driver.as_deref(), Some("cloud"));
/// assert_eq!(config.surface_width, 960);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Pane that holds the driver role after start-up (first pane if absent or unknown)
    pub initial_driver: Option<String>,
    /// Initial background of every pane
    pub background: Color,
    /// Drawing surface size handed to local backends at mount
    pub surface_width: u32,
    pub surface_height: u32,
    /// Point size used by point panes before any quality change
    pub point_size: f32,
    /// Remote pane request policy
    pub remote: RemoteConfig,
}

impl ViewerConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_driver: Some("mesh".to_string()),
            background: Color::default(),
            surface_width: 960,
            surface_height: 540,
            point_size: 1.5,
            remote: RemoteConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
