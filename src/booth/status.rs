//! User-visible booth status.

use std::fmt;

/// The status line shown to people at the booth.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoothStatus {
    /// Nothing to report.
    #[default]
    Idle,
    TakingPhoto,
    Uploading,
    Uploaded,
    /// The backend rejected the upload or could not be reached.
    UploadFailed(String),
    /// The frame could not be turned into a photo.
    CaptureFailed(String),
    /// Camera or detector could not start. Persistent.
    InitFailed(String),
}

impl BoothStatus {
    pub fn message(&self) -> &str {
        match self {
            BoothStatus::Idle => "",
            BoothStatus::TakingPhoto => "Taking photo...",
            BoothStatus::Uploading => "Uploading...",
            BoothStatus::Uploaded => "Photo uploaded successfully!",
            BoothStatus::UploadFailed(msg)
            | BoothStatus::CaptureFailed(msg)
            | BoothStatus::InitFailed(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            BoothStatus::UploadFailed(_) | BoothStatus::CaptureFailed(_) | BoothStatus::InitFailed(_)
        )
    }
}

impl fmt::Display for BoothStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
