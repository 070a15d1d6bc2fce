//! Configuration file handling for photobooth.
//!
//! Loads configuration from `<config dir>/photobooth/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{API_BASE_ENV, DEFAULT_API_BASE};
use crate::booth::{LoopSettings, TriggerPolicy, COOLDOWN, DETECTION_DELAY, MIN_PEOPLE};
use crate::camera::{CameraSettings, Resolution};

/// Configuration file structure for photobooth.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Directory of still images, or an http(s) snapshot URL
    pub source: Option<String>,
    pub mirror: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: None,
            mirror: true,
            width: Resolution::HIGH.width,
            height: Resolution::HIGH.height,
        }
    }
}

impl CameraConfig {
    pub fn settings(&self) -> CameraSettings {
        CameraSettings {
            resolution: Resolution {
                width: self.width,
                height: self.height,
            },
            mirror: self.mirror,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct DetectorConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TriggerConfig {
    pub min_people: usize,
    pub cooldown_ms: u64,
    pub detection_delay_ms: u64,
    pub frame_interval_ms: u64,
    pub status_reset_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            min_people: MIN_PEOPLE,
            cooldown_ms: COOLDOWN.as_millis() as u64,
            detection_delay_ms: DETECTION_DELAY.as_millis() as u64,
            frame_interval_ms: crate::booth::DEFAULT_FRAME_INTERVAL.as_millis() as u64,
            status_reset_ms: crate::booth::DEFAULT_STATUS_RESET.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct OverlayConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed or holds
    /// unusable values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.clone(),
            reason,
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.trigger.min_people == 0 {
            return Err("trigger.min_people must be at least 1".to_string());
        }
        if self.trigger.frame_interval_ms == 0 {
            return Err("trigger.frame_interval_ms must be greater than 0".to_string());
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err("camera.width and camera.height must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Backend base URL: CLI flag, then `PHOTOBOOTH_API_BASE`, then the file,
    /// then the built-in default.
    pub fn api_base(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| std::env::var(API_BASE_ENV).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.backend.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn loop_settings(&self, overlay_cli: Option<PathBuf>) -> LoopSettings {
        let t = &self.trigger;
        LoopSettings {
            policy: TriggerPolicy {
                min_people: t.min_people,
                cooldown: Duration::from_millis(t.cooldown_ms),
                detection_delay: Duration::from_millis(t.detection_delay_ms),
            },
            frame_interval: Duration::from_millis(t.frame_interval_ms),
            status_reset: Duration::from_millis(t.status_reset_ms),
            overlay_path: overlay_cli.or_else(|| self.overlay.path.clone()),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file '{}': {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("photobooth").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/photobooth/config.toml")
        })
}

/// Commented default configuration written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# photobooth configuration

[backend]
# Event backend (overridden by PHOTOBOOTH_API_BASE or --api-base)
# base_url = "http://localhost:8000"

[camera]
# Directory of still images, or an http(s) snapshot URL
# source = "http://192.168.1.50/snapshot.jpg"
# Mirror horizontally (selfie mode)
mirror = true
# Preferred resolution
width = 1280
height = 720

[detector]
# Detection service base URL (serves /health and /detect)
# url = "http://localhost:9000"

[trigger]
# People needed in frame
min_people = 1
# Minimum time between photos
cooldown_ms = 5000
# People must stay in frame this long before the photo is taken
detection_delay_ms = 1000
# Sampling interval
frame_interval_ms = 33
# How long the success message stays up
status_reset_ms = 3000

[overlay]
# Write the annotated frame here each cycle
# path = "/tmp/photobooth-overlay.png"
"#;
