//! Object detection capability consumed by the capture loop.
//!
//! A [`Detector`] turns one frame into a finite list of [`Detection`]s for
//! that frame only. Two implementations ship with the crate:
//! - [`HttpDetector`] calls an external detection service
//! - [`ScriptedDetector`] replays a fixed script, for tests and dry runs

mod http;
mod scripted;
mod types;

use std::future::Future;

use crate::camera::Frame;

pub use http::HttpDetector;
pub use scripted::ScriptedDetector;
pub use types::{person_count, BoundingBox, Detection, PERSON_LABEL};

/// Errors that can occur while initializing or running a detector.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Detector is not ready")]
    NotReady,

    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Detection service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Detection failed: {0}")]
    Failed(String),
}

/// Given a frame, return what is in it.
pub trait Detector: Send {
    /// Load the model or connect to the service. Must complete before the
    /// first call to `detect`.
    fn initialize(&mut self) -> impl Future<Output = Result<(), DetectError>> + Send;

    /// Whether `detect` may be called. A detector that is still warming up
    /// returns false and the frame is skipped.
    fn is_ready(&self) -> bool;

    /// Detect objects in one frame.
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> impl Future<Output = Result<Vec<Detection>, DetectError>> + Send;
}
