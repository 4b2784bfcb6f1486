//! Synthetic frames and photos for offline testing
//!
//! Pixel content is a deterministic gradient so that rotations and crops can
//! be checked without camera hardware.

use crate::geometry::Rect;
use crate::types::{DetectionResult, Frame};
use image::{DynamicImage, Rgb, RgbImage};

/// Create a synthetic BGRA video frame.
pub fn synthetic_video_frame(sequence: u64, width: u32, height: u32) -> Frame {
    let mut data = vec![0u8; (width * height * 4) as usize];

    // Gradient shifts each frame so consecutive frames differ.
    let base = (sequence % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 4) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
            data[idx + 3] = 255;
        }
    }

    Frame {
        sequence,
        timestamp_us: sequence * 33_333,
        width,
        height,
        format: "BGRA".to_string(),
        data,
    }
}

/// Create a synthetic RGB still photo.
pub fn synthetic_photo(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x / 256 + y / 256) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

/// Detection whose box lands on `view_rect` once placed in `preview_display`.
pub fn detection_for_view_rect(view_rect: Rect, preview_display: Rect) -> DetectionResult {
    DetectionResult::new(Rect::new(
        (view_rect.min_x() - preview_display.min_x()) / preview_display.width(),
        (view_rect.min_y() - preview_display.min_y()) / preview_display.height(),
        view_rect.width() / preview_display.width(),
        view_rect.height() / preview_display.height(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::unit_to_preview;

    #[test]
    fn test_frame_layout() {
        let frame = synthetic_video_frame(3, 8, 6);
        assert_eq!(frame.data.len(), 8 * 6 * 4);
        assert_eq!(frame.format, "BGRA");
        assert_eq!(frame.data[3], 255);
    }

    #[test]
    fn test_frames_differ_over_time() {
        let a = synthetic_video_frame(0, 4, 4);
        let b = synthetic_video_frame(1, 4, 4);
        assert_ne!(a.data, b.data);
        assert!(b.timestamp_us > a.timestamp_us);
    }

    #[test]
    fn test_photo_encodes_position() {
        let photo = synthetic_photo(300, 20).to_rgb8();
        assert_eq!(photo.get_pixel(257, 3).0, [1, 3, 1]);
    }

    #[test]
    fn test_detection_inverse_of_unit_to_preview() {
        let display = Rect::new(-121.5, 0.0, 633.0, 844.0);
        let wanted = Rect::new(100.0, 300.0, 230.0, 230.0);
        let det = detection_for_view_rect(wanted, display);
        let back = unit_to_preview(&det.bounding_box, &display);
        assert!((back.min_x() - wanted.min_x()).abs() < 1e-9);
        assert!((back.max_y() - wanted.max_y()).abs() < 1e-9);
    }
}
