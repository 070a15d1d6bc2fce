//! The photobooth: watch the camera, take a photo when people show up.
//!
//! - [`CaptureTrigger`] decides when (debounce, cooldown, one capture at a time)
//! - [`CaptureLoop`] drives it from a frame source and a detector
//! - [`Uploader`] is where photos go, normally the backend

mod capture_loop;
pub mod overlay;
mod status;
mod trigger;
mod upload;

pub use capture_loop::{
    BoothError, BoothReport, CaptureLoop, LoopSettings, StopHandle, CAMERA_INIT_ERROR,
    CAPTURE_ERROR, DEFAULT_FRAME_INTERVAL, DEFAULT_STATUS_RESET, DETECTOR_INIT_ERROR,
};
pub use status::BoothStatus;
pub use trigger::{
    CaptureState, CaptureTrigger, Transition, TriggerPolicy, COOLDOWN, DETECTION_DELAY, MIN_PEOPLE,
};
pub use upload::{failure_message, CapturedPhoto, Uploader};
