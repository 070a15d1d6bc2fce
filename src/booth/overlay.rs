//! Diagnostic overlay: detection boxes and the people count drawn over a copy
//! of the frame.

use std::path::Path;

use image::RgbImage;

use crate::camera::Frame;
use crate::detect::{person_count, Detection};

const PERSON_COLOR: [u8; 3] = [0x00, 0xff, 0x00];
const OTHER_COLOR: [u8; 3] = [0xff, 0x00, 0x00];
const COUNT_COLOR: [u8; 3] = [0xff, 0xff, 0xff];
const LINE_WIDTH: u32 = 3;

/// Top-left corner of the people count.
const COUNT_ORIGIN: (u32, u32) = (20, 16);
/// Each glyph cell is drawn as a `COUNT_SCALE` x `COUNT_SCALE` block.
const COUNT_SCALE: u32 = 4;

/// 3x5 digit glyphs, one row per entry, most significant bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Draw one box outline per detection, green for people and red for
/// everything else, and the people count in the top-left corner. When at
/// least `min_people` people are present the whole frame gets a green border.
pub fn annotate(frame: &Frame, detections: &[Detection], min_people: usize) -> Frame {
    let mut out = frame.clone();
    for detection in detections {
        let color = if detection.is_person() {
            PERSON_COLOR
        } else {
            OTHER_COLOR
        };
        let b = detection.bbox;
        draw_rect(
            &mut out,
            b.x.max(0.0) as u32,
            b.y.max(0.0) as u32,
            b.width.max(0.0) as u32,
            b.height.max(0.0) as u32,
            color,
        );
    }

    let people = person_count(detections);
    draw_count(&mut out, people, COUNT_ORIGIN, COUNT_COLOR);
    if min_people > 0 && people >= min_people {
        let (w, h) = (out.width, out.height);
        draw_rect(&mut out, 0, 0, w, h, PERSON_COLOR);
    }
    out
}

/// Annotate and write the result to `path`; the format follows the extension.
pub fn write_overlay(
    frame: &Frame,
    detections: &[Detection],
    min_people: usize,
    path: &Path,
) -> Result<(), image::ImageError> {
    let annotated = annotate(frame, detections, min_people);
    let Some(image) = RgbImage::from_raw(annotated.width, annotated.height, annotated.data) else {
        log::warn!("Frame buffer does not match its dimensions, overlay skipped");
        return Ok(());
    };
    image.save(path)
}

/// Fill the clipped rectangle `[x0, x1) x [y0, y1)`.
fn fill_rect(frame: &mut Frame, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 3]) {
    let x1 = x1.min(frame.width);
    let y1 = y1.min(frame.height);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let stride = frame.width as usize * 3;
    for y in y0..y1 {
        let row = y as usize * stride;
        for x in x0..x1 {
            let i = row + x as usize * 3;
            frame.data[i..i + 3].copy_from_slice(&color);
        }
    }
}

/// Outline a box with `LINE_WIDTH` thick edges. Only the part inside the
/// frame is touched.
fn draw_rect(frame: &mut Frame, x: u32, y: u32, width: u32, height: u32, color: [u8; 3]) {
    if width == 0 || height == 0 {
        return;
    }
    let right = x.saturating_add(width);
    let bottom = y.saturating_add(height);
    let line = LINE_WIDTH.min(width).min(height);

    fill_rect(frame, x, y, right, y.saturating_add(line), color);
    fill_rect(frame, x, bottom - line, right, bottom, color);
    fill_rect(frame, x, y, x.saturating_add(line), bottom, color);
    fill_rect(frame, right - line, y, right, bottom, color);
}

fn draw_count(frame: &mut Frame, count: usize, origin: (u32, u32), color: [u8; 3]) {
    let (mut x, y) = origin;
    for digit in count.to_string().bytes().map(|b| usize::from(b - b'0')) {
        for (row, bits) in DIGITS[digit].iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) != 0 {
                    let px = x + col * COUNT_SCALE;
                    let py = y + row as u32 * COUNT_SCALE;
                    fill_rect(frame, px, py, px + COUNT_SCALE, py + COUNT_SCALE, color);
                }
            }
        }
        x += 4 * COUNT_SCALE;
    }
}
