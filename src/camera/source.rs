//! The frame source capability consumed by the capture loop.

use std::future::Future;

use super::types::{CameraError, Frame};

/// A live source of frames.
///
/// `open` acquires the underlying device or stream and fails when it is
/// unavailable (permission denied, nothing at the given location). After a
/// successful open, `next_frame` yields the current frame, or `None` while the
/// source is not producing frames yet. `stop` releases the device; it is safe
/// to call more than once.
pub trait FrameSource: Send {
    /// Acquire the source.
    fn open(&mut self) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Fetch the current frame.
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Frame>, CameraError>> + Send;

    /// Release the source.
    fn stop(&mut self);
}
