//! Image finishing: rotate the captured photo upright, then crop it to the
//! capture window.

use crate::geometry::{Rect, Size};
use crate::mapper::map_to_image;
use crate::types::{CaptureOutcome, FinishedImage};
use crate::window::CaptureWindow;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the stored pixels relate to the intended upright picture.
///
/// Names describe the transform needed for display, following the EXIF
/// orientation tag: `Right` is EXIF 6 (rotate 90 degrees clockwise to view),
/// `Left` is EXIF 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    DownMirrored,
    LeftMirrored,
    RightMirrored,
}

impl ImageOrientation {
    /// Orientation for an EXIF `Orientation` tag value. Unknown values are
    /// treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::UpMirrored,
            3 => Self::Down,
            4 => Self::DownMirrored,
            5 => Self::LeftMirrored,
            6 => Self::Right,
            7 => Self::RightMirrored,
            8 => Self::Left,
            _ => Self::Up,
        }
    }

    pub fn to_exif(self) -> u32 {
        match self {
            Self::Up => 1,
            Self::UpMirrored => 2,
            Self::Down => 3,
            Self::DownMirrored => 4,
            Self::LeftMirrored => 5,
            Self::Right => 6,
            Self::RightMirrored => 7,
            Self::Left => 8,
        }
    }

    pub fn is_upright(self) -> bool {
        self == Self::Up
    }

    /// Whether display swaps the stored width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Left | Self::Right | Self::LeftMirrored | Self::RightMirrored
        )
    }
}

impl std::str::FromStr for ImageOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up_mirrored" => Ok(Self::UpMirrored),
            "down_mirrored" => Ok(Self::DownMirrored),
            "left_mirrored" => Ok(Self::LeftMirrored),
            "right_mirrored" => Ok(Self::RightMirrored),
            other => Err(format!("unknown orientation: {other}")),
        }
    }
}

/// Redraw `image` so its stored pixels are upright.
///
/// Upright input is returned untouched. Anything else is rotated/flipped into
/// a freshly allocated RGBA buffer, since cropping works on raw pixel
/// coordinates.
pub fn normalize_orientation(image: DynamicImage, orientation: ImageOrientation) -> DynamicImage {
    let rotated = match orientation {
        ImageOrientation::Up => return image,
        ImageOrientation::Down => image.rotate180(),
        ImageOrientation::Left => image.rotate270(),
        ImageOrientation::Right => image.rotate90(),
        ImageOrientation::UpMirrored => image.fliph(),
        ImageOrientation::DownMirrored => image.flipv(),
        ImageOrientation::LeftMirrored => image.rotate90().fliph(),
        ImageOrientation::RightMirrored => image.rotate270().fliph(),
    };
    DynamicImage::ImageRgba8(rotated.into_rgba8())
}

/// Crop an upright image to the capture window.
///
/// The window is mapped from view coordinates into image pixels with the
/// aspect-fill scale. When the mapped region is degenerate or reaches outside
/// the image, the image is returned as-is. The flag reports whether a crop
/// happened.
pub fn crop_to_window(
    image: DynamicImage,
    window: &Rect,
    preview_display: &Rect,
) -> (DynamicImage, bool) {
    let image_size = Size::from_pixels(image.width(), image.height());
    let mapped = map_to_image(window, preview_display, image_size);

    match mapped.crop_region() {
        Some(region) => {
            log::debug!(
                "Cropping {}x{} image to {}x{} at ({}, {})",
                image.width(),
                image.height(),
                region.width,
                region.height,
                region.x,
                region.y
            );
            (
                image.crop_imm(region.x, region.y, region.width, region.height),
                true,
            )
        }
        None => {
            log::warn!(
                "Crop rect ({:.1}, {:.1}) {:.1}x{:.1} does not fit a {}x{} image, keeping it uncropped",
                mapped.rect.min_x(),
                mapped.rect.min_y(),
                mapped.rect.width(),
                mapped.rect.height(),
                image.width(),
                image.height()
            );
            (image, false)
        }
    }
}

/// Normalize then crop. Never fails: a bad crop yields the upright image.
pub fn finish(
    image: DynamicImage,
    orientation: ImageOrientation,
    window: &Rect,
    preview_display: &Rect,
) -> (DynamicImage, bool) {
    let upright = normalize_orientation(image, orientation);
    crop_to_window(upright, window, preview_display)
}

/// Run the pipeline over a shutter outcome and tag the result with its session.
pub fn finish_capture(
    outcome: CaptureOutcome,
    session_id: Uuid,
    window: &CaptureWindow,
    preview_display: &Rect,
) -> FinishedImage {
    let (image, cropped) = finish(
        outcome.image,
        outcome.orientation,
        &window.bounds,
        preview_display,
    );
    FinishedImage {
        session_id,
        mode: window.mode,
        image,
        cropped,
        captured_at: outcome.captured_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn marked_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn exif_round_trip_covers_all_tags() {
        for tag in 1..=8 {
            assert_eq!(ImageOrientation::from_exif(tag).to_exif(), tag);
        }
        assert_eq!(ImageOrientation::from_exif(0), ImageOrientation::Up);
    }

    #[test]
    fn upright_passes_through() {
        let img = marked_image(4, 3);
        let out = normalize_orientation(img.clone(), ImageOrientation::Up);
        assert_eq!(out, img);
    }

    #[test]
    fn right_rotates_clockwise() {
        let out = normalize_orientation(marked_image(4, 3), ImageOrientation::Right);
        assert_eq!((out.width(), out.height()), (3, 4));
        // Top-left moves to top-right on a clockwise turn.
        let rgba = out.to_rgba8();
        assert_eq!(rgba.get_pixel(2, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn down_rotates_half_turn() {
        let out = normalize_orientation(marked_image(4, 3), ImageOrientation::Down);
        assert_eq!((out.width(), out.height()), (4, 3));
        assert_eq!(out.to_rgba8().get_pixel(3, 2).0, [255, 0, 0, 255]);
    }

    #[test]
    fn crop_fallback_keeps_image() {
        let img = marked_image(100, 100);
        // Preview display of 100x100 maps 1:1; window hangs off the right edge.
        let (out, cropped) = crop_to_window(
            img.clone(),
            &Rect::new(60.0, 10.0, 50.0, 50.0),
            &Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert!(!cropped);
        assert_eq!(out, img);
    }

    #[test]
    fn orientation_parsing() {
        assert_eq!("right".parse::<ImageOrientation>(), Ok(ImageOrientation::Right));
        assert_eq!(
            "left-mirrored".parse::<ImageOrientation>(),
            Ok(ImageOrientation::LeftMirrored)
        );
        assert!("sideways".parse::<ImageOrientation>().is_err());
    }
}
