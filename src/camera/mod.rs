//! Camera frame sources for the photobooth.
//!
//! This module provides:
//! - The [`FrameSource`] capability the capture loop samples from
//! - [`DirectorySource`], replaying still images from disk
//! - [`HttpSnapshotSource`], polling an IP camera snapshot URL
//! - Frame helpers for mirroring and JPEG encoding

mod directory;
pub mod frame_utils;
mod snapshot;
mod source;
mod types;

pub use directory::DirectorySource;
pub use snapshot::HttpSnapshotSource;
pub use source::FrameSource;
pub use types::{CameraError, CameraSettings, Frame, FrameFormat, Resolution};
