//! BackendClient - handles communication with the event backend API.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::types::{
    ErrorPayload, ImageListResponse, PhotoItem, PhotoListResponse, RobotStatus, ScoreUpdate,
    ThresholdResponse, ThresholdUpdate, UploadReceipt,
};

/// The environment variable that overrides the backend base URL.
pub const API_BASE_ENV: &str = "PHOTOBOOTH_API_BASE";

/// Default base URL for the backend API.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Largest page the gallery endpoint serves.
pub const MAX_IMAGE_PAGE: u32 = 500;

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Multipart field the upload endpoint reads the image from.
const UPLOAD_FIELD: &str = "file";

/// Errors that can occur when talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// Message taken from the error body
        message: String,
    },

    #[error("{name} must be between {min} and {max}, got {value}")]
    InvalidValue {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl BackendError {
    /// HTTP status of an API error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::HttpError(e) => e.status().map(|s| s.as_u16()),
            BackendError::InvalidValue { .. } => None,
        }
    }
}

/// Check that a score or threshold lies in 0..=1.
pub fn validate_unit(name: &'static str, value: f64) -> Result<f64, BackendError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(BackendError::InvalidValue {
            name,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(value)
}

/// Client for the photo-capture event backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl BackendClient {
    /// Create a client from `PHOTOBOOTH_API_BASE`, falling back to
    /// [`DEFAULT_API_BASE`].
    pub fn new() -> Result<Self, BackendError> {
        let base_url = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_base_url(base_url)
    }

    /// Create a client for an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload a JPEG photo as the multipart field `file`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with the backend's message for non-2xx
    /// responses, or `BackendError::HttpError` if the request fails.
    pub async fn upload_photo(
        &self,
        jpeg: Vec<u8>,
        filename: &str,
    ) -> Result<UploadReceipt, BackendError> {
        let size = jpeg.len();
        let part = Part::bytes(jpeg)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        log::info!("Uploading {} ({} bytes)", filename, size);
        let response = self
            .http_client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        let response = check(response, "Upload").await?;

        // A 2xx with an unexpected body still counts as an upload.
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    /// List public gallery images.
    pub async fn list_images(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ImageListResponse, BackendError> {
        if limit < 1 || limit > MAX_IMAGE_PAGE {
            return Err(BackendError::InvalidValue {
                name: "limit",
                value: limit as f64,
                min: 1.0,
                max: MAX_IMAGE_PAGE as f64,
            });
        }
        let response = self
            .http_client
            .get(self.url("/images"))
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        json(response).await
    }

    /// List every photo with its score, plus the current threshold.
    pub async fn admin_photos(&self) -> Result<PhotoListResponse, BackendError> {
        let response = self
            .http_client
            .get(self.url("/admin/photos"))
            .send()
            .await?;
        json(response).await
    }

    /// Set the gallery threshold (0..=1).
    pub async fn update_threshold(&self, threshold: f64) -> Result<ThresholdResponse, BackendError> {
        let threshold = validate_unit("threshold", threshold)?;
        let response = self
            .http_client
            .patch(self.url("/admin/settings"))
            .json(&ThresholdUpdate { threshold })
            .send()
            .await?;
        json(response).await
    }

    /// Override the score of one photo (0..=1).
    pub async fn update_score(&self, photo_id: &str, score: f64) -> Result<PhotoItem, BackendError> {
        let score = validate_unit("score", score)?;
        let response = self
            .http_client
            .patch(self.url(&format!("/admin/photos/{}/score", photo_id)))
            .json(&ScoreUpdate { score })
            .send()
            .await?;
        json(response).await
    }

    /// Delete one photo.
    pub async fn delete_photo(&self, photo_id: &str) -> Result<(), BackendError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/admin/photos/{}", photo_id)))
            .send()
            .await?;
        check(response, "Request").await?;
        Ok(())
    }

    /// Start the remote capture robot.
    pub async fn robot_start(&self) -> Result<RobotStatus, BackendError> {
        let response = self.http_client.post(self.url("/robot/start")).send().await?;
        json(response).await
    }

    /// Stop the remote capture robot.
    pub async fn robot_stop(&self) -> Result<RobotStatus, BackendError> {
        let response = self.http_client.post(self.url("/robot/stop")).send().await?;
        json(response).await
    }

    pub async fn robot_status(&self) -> Result<RobotStatus, BackendError> {
        let response = self.http_client.get(self.url("/robot/status")).send().await?;
        json(response).await
    }

    /// Ask the remote device to capture immediately.
    pub async fn capture_now(&self) -> Result<(), BackendError> {
        let response = self.http_client.post(self.url("/capture")).send().await?;
        check(response, "Request").await?;
        Ok(())
    }
}

/// Turn a non-2xx response into `BackendError::Api`.
///
/// The message is the body's `error` field, else its `detail` field, else
/// `"<action> failed: <status>"`.
async fn check(
    response: reqwest::Response,
    action: &str,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorPayload>(&text)
        .ok()
        .and_then(|payload| payload.message())
        .unwrap_or_else(|| format!("{} failed: {}", action, status.as_u16()));

    log::warn!("Backend responded {}: {}", status, message);
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let response = check(response, "Request").await?;
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let client = BackendClient::with_base_url("http://backend:8000/").unwrap();
        assert_eq!(client.base_url(), "http://backend:8000");
        assert_eq!(client.url("/upload"), "http://backend:8000/upload");
    }

    #[test]
    fn test_validate_unit_bounds() {
        assert_eq!(validate_unit("score", 0.0).unwrap(), 0.0);
        assert_eq!(validate_unit("score", 1.0).unwrap(), 1.0);
        assert!(validate_unit("score", 1.01).is_err());
        assert!(validate_unit("score", -0.1).is_err());
        assert!(validate_unit("score", f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_value_display() {
        let err = validate_unit("threshold", 2.0).unwrap_err();
        assert_eq!(err.to_string(), "threshold must be between 0 and 1, got 2");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_api_error_display_is_backend_message() {
        let err = BackendError::Api {
            status: 500,
            message: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.status(), Some(500));
    }
}
