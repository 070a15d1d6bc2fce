//! Payloads exchanged with the event backend.

use serde::{Deserialize, Serialize};

/// Body returned by `POST /upload` on success.
///
/// The backend has returned both `{name, url}` and
/// `{id, storage_path, score, url}` shapes, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A public gallery image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageItem {
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageListResponse {
    #[serde(default)]
    pub items: Vec<ImageItem>,
    pub limit: u32,
    pub offset: u32,
}

/// A moderated photo as seen by the admin surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoItem {
    pub id: String,
    pub storage_path: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PhotoItem {
    /// Whether the photo clears the gallery threshold. Unscored photos never do.
    pub fn is_approved(&self, threshold: f64) -> bool {
        self.score.is_some_and(|score| score >= threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoListResponse {
    #[serde(default)]
    pub items: Vec<PhotoItem>,
    pub limit: u32,
    pub offset: u32,
    pub threshold: f64,
}

impl PhotoListResponse {
    pub fn approved_count(&self) -> usize {
        approved_count(&self.items, self.threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResponse {
    pub threshold: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ThresholdUpdate {
    pub threshold: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreUpdate {
    pub score: f64,
}

/// State reported by the robot control endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RobotStatus {
    pub status: String,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// Human-readable message: `error`, then `detail`.
    pub fn message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        match &self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Number of photos whose score is present and at or above `threshold`.
pub fn approved_count(items: &[PhotoItem], threshold: f64) -> usize {
    items.iter().filter(|item| item.is_approved(threshold)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, score: Option<f64>) -> PhotoItem {
        PhotoItem {
            id: id.to_string(),
            storage_path: format!("photos/{}.jpg", id),
            score,
            url: None,
        }
    }

    #[test]
    fn test_approved_count_uses_inclusive_threshold() {
        let items = vec![
            photo("a", Some(0.75)),
            photo("b", Some(0.74)),
            photo("c", None),
            photo("d", Some(1.0)),
        ];
        assert_eq!(approved_count(&items, 0.75), 2);
        assert_eq!(approved_count(&items, 0.0), 3);
        assert_eq!(approved_count(&[], 0.5), 0);
    }

    #[test]
    fn test_error_payload_prefers_error_over_detail() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"error":"disk full","detail":"ignored"}"#).unwrap();
        assert_eq!(payload.message().as_deref(), Some("disk full"));
    }

    #[test]
    fn test_error_payload_detail_forms() {
        let payload: ErrorPayload = serde_json::from_str(r#"{"detail":"Missing file"}"#).unwrap();
        assert_eq!(payload.message().as_deref(), Some("Missing file"));

        let payload: ErrorPayload =
            serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert!(payload.message().unwrap().contains("field required"));

        let payload: ErrorPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.message(), None);
    }

    #[test]
    fn test_upload_receipt_accepts_both_shapes() {
        let a: UploadReceipt =
            serde_json::from_str(r#"{"name":"x.jpg","url":"https://cdn/x.jpg"}"#).unwrap();
        assert_eq!(a.name.as_deref(), Some("x.jpg"));

        let b: UploadReceipt =
            serde_json::from_str(r#"{"id":"42","storage_path":"p/42.jpg","score":0.8}"#).unwrap();
        assert_eq!(b.id.as_deref(), Some("42"));
        assert_eq!(b.score, Some(0.8));
    }
}
