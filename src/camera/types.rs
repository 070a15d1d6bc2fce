//! Camera types and data structures.

use std::time::Instant;

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// High resolution (1280x720) - preferred for booth photos
    pub const HIGH: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HIGH
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Create a frame filled with a single RGB colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }
}

/// Settings requested from a frame source.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Preferred resolution; sources scale to it when the feed differs
    pub resolution: Resolution,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            mirror: true,
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera source not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    #[error("Failed to read camera stream: {0}")]
    StreamFailed(String),

    #[error("Failed to decode frame: {0}")]
    DecodeFailed(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
