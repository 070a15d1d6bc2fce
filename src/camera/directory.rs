//! Replays a directory of still images as a looping frame feed.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::frame_utils::decode_frame;
use super::source::FrameSource;
use super::types::{CameraError, CameraSettings, Frame};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Frame source backed by the images in a directory, in file-name order.
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    settings: CameraSettings,
    frames: Vec<Frame>,
    cursor: usize,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, settings: CameraSettings) -> Self {
        Self {
            dir: dir.into(),
            settings,
            frames: Vec::new(),
            cursor: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frames loaded by `open`.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for DirectorySource {
    async fn open(&mut self) -> Result<(), CameraError> {
        if !self.dir.is_dir() {
            return Err(CameraError::DeviceNotFound(self.dir.display().to_string()));
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes = tokio::fs::read(path).await?;
            match decode_frame(&bytes, &self.settings) {
                Ok(frame) => frames.push(frame),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if frames.is_empty() {
            return Err(CameraError::OpenFailed(format!(
                "no readable images in {}",
                self.dir.display()
            )));
        }

        log::info!(
            "Replaying {} frame(s) from {}",
            frames.len(),
            self.dir.display()
        );
        self.frames = frames;
        self.cursor = 0;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        let mut frame = self.frames[self.cursor].clone();
        frame.timestamp = Instant::now();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(Some(frame))
    }

    fn stop(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::frame_utils::{encode_jpeg, JPEG_QUALITY};

    fn write_still(dir: &Path, name: &str, rgb: [u8; 3]) {
        let jpeg = encode_jpeg(&Frame::solid(8, 4, rgb), JPEG_QUALITY).unwrap();
        std::fs::write(dir.join(name), jpeg).unwrap();
    }

    fn unmirrored() -> CameraSettings {
        CameraSettings {
            mirror: false,
            ..CameraSettings::default()
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_found() {
        let mut source = DirectorySource::new("/definitely/not/here", unmirrored());
        let result = source.open().await;
        assert!(matches!(result, Err(CameraError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn test_directory_without_images_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let mut source = DirectorySource::new(dir.path(), unmirrored());
        assert!(matches!(
            source.open().await,
            Err(CameraError::OpenFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_frames_cycle_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_still(dir.path(), "b.jpg", [0, 0, 0]);
        write_still(dir.path(), "a.jpg", [255, 255, 255]);

        let mut source = DirectorySource::new(dir.path(), unmirrored());
        source.open().await.unwrap();
        assert_eq!(source.len(), 2);

        let first = source.next_frame().await.unwrap().unwrap();
        let second = source.next_frame().await.unwrap().unwrap();
        let third = source.next_frame().await.unwrap().unwrap();
        // a.jpg is white, b.jpg is black
        assert!(first.data[0] > 200);
        assert!(second.data[0] < 50);
        assert_eq!(first.data, third.data);
    }

    #[tokio::test]
    async fn test_not_producing_before_open_and_after_stop() {
        let dir = tempfile::tempdir().unwrap();
        write_still(dir.path(), "a.jpg", [1, 2, 3]);

        let mut source = DirectorySource::new(dir.path(), unmirrored());
        assert!(source.next_frame().await.unwrap().is_none());

        source.open().await.unwrap();
        assert!(source.next_frame().await.unwrap().is_some());

        source.stop();
        assert!(source.is_empty());
        assert!(source.next_frame().await.unwrap().is_none());
    }
}
