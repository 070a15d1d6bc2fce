//! Deterministic detector that replays a fixed script of per-frame results.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use super::types::{BoundingBox, Detection};
use super::{DetectError, Detector};
use crate::camera::Frame;

/// Replays one scripted result per `detect` call.
///
/// Once the script is exhausted every frame yields no detections. A warm-up
/// period can be configured during which `is_ready` reports false after
/// initialization.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    script: VecDeque<Result<Vec<Detection>, String>>,
    warmup: Duration,
    ready_at: Option<Instant>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a script where frame `i` contains `counts[i]` people.
    pub fn from_person_counts(counts: &[usize]) -> Self {
        counts
            .iter()
            .fold(Self::new(), |detector, &count| detector.then_people(count))
    }

    /// Next frame contains `count` people, side by side.
    pub fn then_people(self, count: usize) -> Self {
        let detections = (0..count)
            .map(|i| Detection::person(0.9, BoundingBox::new(i as f32 * 120.0, 40.0, 100.0, 300.0)))
            .collect();
        self.then_detections(detections)
    }

    /// Next frame yields exactly `detections`.
    pub fn then_detections(mut self, detections: Vec<Detection>) -> Self {
        self.script.push_back(Ok(detections));
        self
    }

    /// Next frame fails with `message`.
    pub fn then_failure(mut self, message: impl Into<String>) -> Self {
        self.script.push_back(Err(message.into()));
        self
    }

    /// Report not-ready for `warmup` after initialization.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Number of `detect` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Detector for ScriptedDetector {
    async fn initialize(&mut self) -> Result<(), DetectError> {
        self.ready_at = Some(Instant::now() + self.warmup);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready_at.is_some_and(|at| Instant::now() >= at)
    }

    async fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        if self.ready_at.is_none() {
            return Err(DetectError::NotReady);
        }
        self.calls += 1;
        match self.script.pop_front() {
            Some(Ok(detections)) => Ok(detections),
            Some(Err(message)) => Err(DetectError::Failed(message)),
            None => Ok(Vec::new()),
        }
    }
}
