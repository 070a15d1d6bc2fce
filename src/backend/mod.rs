//! HTTP client for the photo-capture event backend.
//!
//! The backend owns photo storage, scoring, thresholds and the remote capture
//! device. This module only issues the calls and decodes the payloads.

mod client;
mod types;

pub use client::{
    validate_unit, BackendClient, BackendError, API_BASE_ENV, DEFAULT_API_BASE, MAX_IMAGE_PAGE,
};
pub use types::{
    approved_count, ImageItem, ImageListResponse, PhotoItem, PhotoListResponse, RobotStatus,
    ThresholdResponse, UploadReceipt,
};
