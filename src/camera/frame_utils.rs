//! Frame conversion and transformation utilities.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageResult};
use std::time::Instant;

use super::types::{CameraError, CameraSettings, Frame, FrameFormat};

/// JPEG quality used for booth photos.
pub const JPEG_QUALITY: u8 = 95;

/// Decode an encoded still (JPEG, PNG) into an RGB frame shaped by `settings`.
pub fn decode_frame(bytes: &[u8], settings: &CameraSettings) -> Result<Frame, CameraError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| CameraError::DecodeFailed(e.to_string()))?;
    Ok(frame_from_image(image, settings))
}

/// Convert a decoded image into an RGB frame.
///
/// Images larger than the preferred resolution are scaled down to fit it,
/// keeping the aspect ratio. Mirroring is applied last.
pub fn frame_from_image(image: DynamicImage, settings: &CameraSettings) -> Frame {
    let target = settings.resolution;
    let image = if image.width() > target.width || image.height() > target.height {
        image.resize(target.width, target.height, FilterType::Triangle)
    } else {
        image
    };
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut frame = Frame {
        data: rgb.into_raw(),
        width,
        height,
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    };
    if settings.mirror {
        mirror_horizontal(&mut frame);
    }
    frame
}

/// Encode a frame as a JPEG still.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)?;
    Ok(buf)
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut frame.data[row_start..row_start + width * bpp];

        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
