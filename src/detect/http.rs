//! Detector backed by an HTTP detection service.
//!
//! Protocol:
//! - `GET {base}/health` must succeed before the detector is ready
//! - `POST {base}/detect` with a JPEG body returns a JSON array of detections

use std::time::Duration;

use super::types::Detection;
use super::{DetectError, Detector};
use crate::camera::frame_utils::encode_jpeg;
use crate::camera::Frame;

/// Timeout for a single detection request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames sent for detection do not need booth-photo quality.
const DETECT_JPEG_QUALITY: u8 = 80;

pub struct HttpDetector {
    base_url: String,
    http_client: reqwest::Client,
    ready: bool,
}

impl HttpDetector {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DetectError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            ready: false,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Detector for HttpDetector {
    async fn initialize(&mut self) -> Result<(), DetectError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| DetectError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DetectError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )));
        }

        log::info!("Detection service ready at {}", self.base_url);
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        if !self.ready {
            return Err(DetectError::NotReady);
        }

        let body = encode_jpeg(frame, DETECT_JPEG_QUALITY)?;
        let url = format!("{}/detect", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "image/jpeg")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DetectError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn healthy_server() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_not_ready_until_initialized() {
        let mock_server = healthy_server().await;
        let mut detector = HttpDetector::new(mock_server.uri()).unwrap();
        assert!(!detector.is_ready());

        let frame = Frame::solid(4, 4, [0, 0, 0]);
        assert!(matches!(
            detector.detect(&frame).await,
            Err(DetectError::NotReady)
        ));

        detector.initialize().await.unwrap();
        assert!(detector.is_ready());
    }

    #[tokio::test]
    async fn test_failed_health_check_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let mut detector = HttpDetector::new(mock_server.uri()).unwrap();
        assert!(matches!(
            detector.initialize().await,
            Err(DetectError::Unavailable(_))
        ));
        assert!(!detector.is_ready());
    }

    #[tokio::test]
    async fn test_detect_posts_jpeg_and_parses_detections() {
        let mock_server = healthy_server().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .and(header("Content-Type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"label": "person", "confidence": 0.91, "bbox": [10.0, 20.0, 100.0, 200.0]},
                {"label": "chair", "confidence": 0.55, "bbox": [0.0, 0.0, 5.0, 5.0]}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut detector = HttpDetector::new(format!("{}/", mock_server.uri())).unwrap();
        detector.initialize().await.unwrap();

        let detections = detector.detect(&Frame::solid(8, 8, [1, 2, 3])).await.unwrap();
        assert_eq!(detections.len(), 2);
        assert!(detections[0].is_person());
        assert_eq!(detections[1].label, "chair");
    }

    #[tokio::test]
    async fn test_service_error_carries_status_and_body() {
        let mock_server = healthy_server().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&mock_server)
            .await;

        let mut detector = HttpDetector::new(mock_server.uri()).unwrap();
        detector.initialize().await.unwrap();

        match detector.detect(&Frame::solid(2, 2, [0, 0, 0])).await {
            Err(DetectError::Service { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "model crashed");
            }
            other => panic!("Expected Service error, got {:?}", other),
        }
    }
}
