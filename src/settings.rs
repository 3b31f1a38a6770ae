//! Driver settings loaded once at startup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("cannot read settings file {path}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid settings JSON.
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-camera driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Serial of the camera to open; 0 opens the first one found.
    pub serial: u32,
    /// Reject frames the device flags as incomplete.
    pub enable_frame_checking: bool,
    /// Grab timeout in milliseconds.
    pub timeout_ms: u64,
    /// Frame rate forced after every configuration, if set.
    pub frame_rate_override: Option<f64>,
    /// Coordinate frame label stamped on every image.
    pub frame_id: String,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            serial: 0,
            enable_frame_checking: false,
            timeout_ms: 1000,
            frame_rate_override: None,
            frame_id: "camera".to_owned(),
        }
    }
}

impl DriverSettings {
    /// Parse settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Grab timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
