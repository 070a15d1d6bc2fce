//! Turning a frame into an uploaded booth photo.

use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::{BackendClient, BackendError, UploadReceipt};
use crate::camera::frame_utils::{encode_jpeg, JPEG_QUALITY};
use crate::camera::Frame;

/// An encoded photo ready for upload.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub filename: String,
    pub jpeg: Vec<u8>,
}

impl CapturedPhoto {
    /// Encode `frame` as a JPEG named after the current wall-clock time.
    pub fn from_frame(frame: &Frame) -> Result<Self, image::ImageError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Ok(Self {
            filename: format!("photobooth_{}.jpg", millis),
            jpeg: encode_jpeg(frame, JPEG_QUALITY)?,
        })
    }
}

/// Where captured photos go.
pub trait Uploader: Send + Sync + 'static {
    fn upload(
        &self,
        photo: CapturedPhoto,
    ) -> impl Future<Output = Result<UploadReceipt, BackendError>> + Send;
}

impl Uploader for BackendClient {
    async fn upload(&self, photo: CapturedPhoto) -> Result<UploadReceipt, BackendError> {
        self.upload_photo(photo.jpeg, &photo.filename).await
    }
}

/// Status text for a failed upload: the backend's own message when it sent
/// one, otherwise the transport error.
pub fn failure_message(error: &BackendError) -> String {
    match error {
        BackendError::Api { message, .. } => message.clone(),
        other => format!("Error uploading: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_filename_and_encoding() {
        let photo = CapturedPhoto::from_frame(&Frame::solid(8, 8, [0, 128, 255])).unwrap();
        assert!(photo.filename.starts_with("photobooth_"));
        assert!(photo.filename.ends_with(".jpg"));
        assert_eq!(&photo.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_failure_message_prefers_backend_text() {
        let api = BackendError::Api {
            status: 500,
            message: "disk full".to_string(),
        };
        assert_eq!(failure_message(&api), "disk full");

        let invalid = BackendError::InvalidValue {
            name: "score",
            value: 2.0,
            min: 0.0,
            max: 1.0,
        };
        assert!(failure_message(&invalid).starts_with("Error uploading: "));
    }
}
