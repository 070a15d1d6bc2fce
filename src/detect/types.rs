//! Detection records produced per frame.

use serde::{Deserialize, Serialize};

/// Label the detector assigns to people.
pub const PERSON_LABEL: &str = "person";

/// Axis-aligned box in pixel space of the frame it was detected in.
///
/// Serialized as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One object recognized in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Category label, e.g. "person"
    pub label: String,
    /// Classification confidence in 0..=1
    pub confidence: f32,
    /// Location in the frame
    pub bbox: BoundingBox,
}

impl Detection {
    /// A person detection with the given confidence and box.
    pub fn person(confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: PERSON_LABEL.to_string(),
            confidence,
            bbox,
        }
    }

    pub fn is_person(&self) -> bool {
        self.label == PERSON_LABEL
    }
}

/// Number of detections labelled as a person.
pub fn person_count(detections: &[Detection]) -> usize {
    detections.iter().filter(|d| d.is_person()).count()
}
