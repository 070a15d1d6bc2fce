//! Frame source that polls a still-image URL (IP camera snapshot endpoint).

use std::time::Duration;

use reqwest::StatusCode;

use super::frame_utils::decode_frame;
use super::source::FrameSource;
use super::types::{CameraError, CameraSettings, Frame};

/// Default timeout for a single snapshot request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Fetches one JPEG per frame from an HTTP snapshot URL.
pub struct HttpSnapshotSource {
    url: String,
    settings: CameraSettings,
    http_client: reqwest::Client,
    open: bool,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>, settings: CameraSettings) -> Result<Self, CameraError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            url: url.into(),
            settings,
            http_client,
            open: false,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Frame, CameraError> {
        let response = self.http_client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CameraError::PermissionDenied,
                StatusCode::NOT_FOUND => CameraError::DeviceNotFound(self.url.clone()),
                _ => CameraError::StreamFailed(format!("snapshot returned {}", status)),
            });
        }
        let bytes = response.bytes().await?;
        decode_frame(&bytes, &self.settings)
    }
}

impl FrameSource for HttpSnapshotSource {
    async fn open(&mut self) -> Result<(), CameraError> {
        // The first snapshot proves the camera is reachable and decodable.
        let frame = self.fetch().await?;
        log::info!(
            "Snapshot camera at {} is live ({}x{})",
            self.url,
            frame.width,
            frame.height
        );
        self.open = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        if !self.open {
            return Ok(None);
        }
        self.fetch().await.map(Some)
    }

    fn stop(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::frame_utils::{encode_jpeg, JPEG_QUALITY};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jpeg_body() -> Vec<u8> {
        encode_jpeg(&Frame::solid(4, 4, [9, 9, 9]), JPEG_QUALITY).unwrap()
    }

    #[tokio::test]
    async fn test_open_then_frames() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/snapshot.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(jpeg_body()),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/snapshot.jpg", mock_server.uri());
        let mut source = HttpSnapshotSource::new(url, CameraSettings::default()).unwrap();
        assert!(source.next_frame().await.unwrap().is_none());

        source.open().await.unwrap();
        let frame = source.next_frame().await.unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));

        source.stop();
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_forbidden_is_permission_denied() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let mut source =
            HttpSnapshotSource::new(mock_server.uri(), CameraSettings::default()).unwrap();
        assert!(matches!(
            source.open().await,
            Err(CameraError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let mut source =
            HttpSnapshotSource::new(mock_server.uri(), CameraSettings::default()).unwrap();
        assert!(matches!(
            source.open().await,
            Err(CameraError::DeviceNotFound(_))
        ));
    }
}
