//! The photobooth capture loop.
//!
//! One cooperative loop owns the frame source, the detector and the
//! [`CaptureTrigger`]. Each tick samples a frame, counts people and feeds the
//! trigger. The debounce deadline is a branch of the same `select!`, so
//! cancelling it is just disarming the trigger. Uploads run in a spawned task
//! whose handle is another branch, so sampling continues while they run and a
//! panicking upload still ends the capture.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant, MissedTickBehavior};

use super::overlay::write_overlay;
use super::status::BoothStatus;
use super::trigger::{CaptureTrigger, Transition, TriggerPolicy};
use super::upload::{failure_message, CapturedPhoto, Uploader};
use crate::backend::{BackendError, UploadReceipt};
use crate::camera::{CameraError, FrameSource};
use crate::detect::{person_count, DetectError, Detector};

/// Default sampling interval (~30 FPS).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// How long the upload success message stays up.
pub const DEFAULT_STATUS_RESET: Duration = Duration::from_millis(3000);

/// Status shown when the camera cannot be opened.
pub const CAMERA_INIT_ERROR: &str = "Error accessing camera";

/// Status shown when the detector cannot be initialized.
pub const DETECTOR_INIT_ERROR: &str = "Error loading detection model";

/// Status shown when no photo could be made from the current frame.
pub const CAPTURE_ERROR: &str = "Error creating image";

/// Errors that prevent the loop from starting.
#[derive(Debug, thiserror::Error)]
pub enum BoothError {
    #[error("Error accessing camera: {0}")]
    Camera(#[from] CameraError),

    #[error("Error loading detection model: {0}")]
    Detector(#[from] DetectError),
}

/// Loop tunables.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub policy: TriggerPolicy,
    pub frame_interval: Duration,
    pub status_reset: Duration,
    /// Where to write the annotated frame each cycle, if anywhere.
    pub overlay_path: Option<PathBuf>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            policy: TriggerPolicy::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            status_reset: DEFAULT_STATUS_RESET,
            overlay_path: None,
        }
    }
}

/// What happened during a run, returned on teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoothReport {
    /// Cycles that ran detection.
    pub frames: u64,
    /// Cycles skipped because the source or detector was not ready.
    pub skipped: u64,
    pub detection_errors: u64,
    /// Completion times of successful uploads, in order.
    pub captures: Vec<Instant>,
    pub failed_uploads: u64,
}

/// Signals the loop to tear down. Cloneable, usable from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

type UploadOutcome = Result<UploadReceipt, BackendError>;

pub struct CaptureLoop<S, D, U> {
    source: S,
    detector: D,
    uploader: Arc<U>,
    settings: LoopSettings,
    status_tx: watch::Sender<BoothStatus>,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl<S, D, U> CaptureLoop<S, D, U>
where
    S: FrameSource,
    D: Detector,
    U: Uploader,
{
    pub fn new(source: S, detector: D, uploader: U, settings: LoopSettings) -> Self {
        let (status_tx, _) = watch::channel(BoothStatus::Idle);
        let (stop_tx, _) = watch::channel(false);
        Self {
            source,
            detector,
            uploader: Arc::new(uploader),
            settings,
            status_tx,
            stop_tx: Arc::new(stop_tx),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_tx.clone())
    }

    /// Watch the user-visible status.
    pub fn subscribe(&self) -> watch::Receiver<BoothStatus> {
        self.status_tx.subscribe()
    }

    fn publish(&self, status: BoothStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Run until stopped.
    ///
    /// # Errors
    ///
    /// Returns `BoothError` if the source cannot be opened or the detector
    /// cannot be initialized; the failure is also published as a persistent
    /// status. Nothing that happens after start-up ends the loop.
    pub async fn run(mut self) -> Result<BoothReport, BoothError> {
        if let Err(e) = self.source.open().await {
            log::error!("Error accessing webcam: {}", e);
            self.publish(BoothStatus::InitFailed(CAMERA_INIT_ERROR.to_string()));
            return Err(e.into());
        }
        if let Err(e) = self.detector.initialize().await {
            log::error!("Error loading model: {}", e);
            self.source.stop();
            self.publish(BoothStatus::InitFailed(DETECTOR_INIT_ERROR.to_string()));
            return Err(e.into());
        }

        let mut stop_rx = self.stop_tx.subscribe();
        let mut upload_task: Option<JoinHandle<UploadOutcome>> = None;
        let mut trigger = CaptureTrigger::new(self.settings.policy);
        let mut report = BoothReport::default();
        let mut status_clear_at: Option<Instant> = None;
        let mut last_people: Option<usize> = None;

        let mut ticker = tokio::time::interval(self.settings.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!("Capture loop running");
        loop {
            if *stop_rx.borrow_and_update() {
                break;
            }
            let deadline = trigger.deadline();

            tokio::select! {
                biased;

                _ = stop_rx.changed() => {}

                joined = async {
                    match upload_task.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if upload_task.is_some() => {
                    upload_task = None;
                    let now = Instant::now();
                    status_clear_at = self.finish_capture(&mut trigger, &mut report, joined, now);
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let now = Instant::now();
                    if trigger.fire(now) {
                        log::info!("Taking photo now!");
                        status_clear_at = None;
                        match self.start_capture().await {
                            Ok(handle) => upload_task = Some(handle),
                            Err(message) => {
                                trigger.complete(false, now);
                                self.publish(BoothStatus::CaptureFailed(message));
                            }
                        }
                    }
                }

                _ = ticker.tick() => {
                    let now = Instant::now();
                    if status_clear_at.is_some_and(|at| now >= at) {
                        status_clear_at = None;
                        if *self.status_tx.borrow() == BoothStatus::Uploaded {
                            self.publish(BoothStatus::Idle);
                        }
                    }
                    if let Some(people) = self.cycle(&mut trigger, &mut report).await {
                        if last_people != Some(people) {
                            log::info!("People detected: {}", people);
                            last_people = Some(people);
                        }
                    }
                }
            }
        }

        // Teardown: the pending deadline dies with the trigger, the source is
        // released, and an upload already on the wire is allowed to finish.
        self.source.stop();
        if let Some(handle) = upload_task.take() {
            log::info!("Waiting for in-flight upload before shutdown");
            let joined = handle.await;
            self.finish_capture(&mut trigger, &mut report, joined, Instant::now());
        }
        log::info!(
            "Capture loop stopped after {} frame(s), {} photo(s)",
            report.frames,
            report.captures.len()
        );
        Ok(report)
    }

    /// One detection cycle. Returns the people count when detection ran.
    async fn cycle(
        &mut self,
        trigger: &mut CaptureTrigger,
        report: &mut BoothReport,
    ) -> Option<usize> {
        if !self.detector.is_ready() {
            report.skipped += 1;
            return None;
        }
        let frame = match self.source.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                report.skipped += 1;
                return None;
            }
            Err(e) => {
                log::warn!("Frame error: {}", e);
                report.skipped += 1;
                return None;
            }
        };

        let detections = match self.detector.detect(&frame).await {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("Detection error: {}", e);
                report.detection_errors += 1;
                return None;
            }
        };
        report.frames += 1;

        let people = person_count(&detections);
        match trigger.observe(people, Instant::now()) {
            Transition::Armed { .. } => log::debug!(
                "Scheduling photo in {:?}",
                trigger.policy().detection_delay
            ),
            Transition::Disarmed => log::debug!("Pending photo cancelled"),
            Transition::Unchanged => {}
        }

        if let Some(path) = &self.settings.overlay_path {
            if let Err(e) = write_overlay(&frame, &detections, trigger.policy().min_people, path) {
                log::warn!("Failed to write overlay {}: {}", path.display(), e);
            }
        }
        Some(people)
    }

    /// Snapshot the current frame and start its upload in the background.
    async fn start_capture(&mut self) -> Result<JoinHandle<UploadOutcome>, String> {
        self.publish(BoothStatus::TakingPhoto);

        let frame = match self.source.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return Err(CAPTURE_ERROR.to_string()),
            Err(e) => return Err(format!("Error: {}", e)),
        };
        let photo = CapturedPhoto::from_frame(&frame).map_err(|e| {
            log::error!("Photo error: {}", e);
            CAPTURE_ERROR.to_string()
        })?;

        self.publish(BoothStatus::Uploading);
        log::info!("Uploading file: {} Size: {}", photo.filename, photo.jpeg.len());

        let uploader = self.uploader.clone();
        Ok(tokio::spawn(async move { uploader.upload(photo).await }))
    }

    /// Apply the result of an upload task. A task that panicked or was
    /// cancelled counts as a failed upload. Returns when the status should
    /// reset.
    fn finish_capture(
        &self,
        trigger: &mut CaptureTrigger,
        report: &mut BoothReport,
        joined: Result<UploadOutcome, JoinError>,
        now: Instant,
    ) -> Option<Instant> {
        let outcome = match joined {
            Ok(outcome) => outcome.map_err(|e| {
                log::error!("Upload error: {}", e);
                failure_message(&e)
            }),
            Err(e) => {
                log::error!("Upload task failed: {}", e);
                Err(format!("Error uploading: {}", e))
            }
        };
        match outcome {
            Ok(receipt) => {
                trigger.complete(true, now);
                report.captures.push(now);
                log::info!("Upload successful: {:?}", receipt);
                self.publish(BoothStatus::Uploaded);
                Some(now + self.settings.status_reset)
            }
            Err(message) => {
                trigger.complete(false, now);
                report.failed_uploads += 1;
                self.publish(BoothStatus::UploadFailed(message));
                None
            }
        }
    }
}
