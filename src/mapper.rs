//! Conversions between unit detection space, the live preview and captured images.
//!
//! The preview shows the camera feed with aspect-fill gravity: the frame is
//! scaled uniformly until it covers the view, so one axis overflows the view
//! and is cut off. The visible part of the feed is described by the
//! *preview display rect*, the unit square expressed in view coordinates.

use crate::geometry::{CropRegion, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// A rectangle expressed in the coordinate space of a specific target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappedRect {
    pub rect: Rect,
    /// Dimensions of the target the rect lives in.
    pub target: Size,
    /// Uniform scale used to get from preview units to target units.
    pub scale: f64,
}

impl MappedRect {
    /// Whether the rect is non-degenerate and fully inside its target.
    pub fn is_within_target(&self) -> bool {
        self.rect.is_finite()
            && !self.rect.is_empty()
            && Rect::from_size(self.target).contains_rect(&self.rect)
    }

    /// Pixel region to crop, if the rect is usable for cropping.
    pub fn crop_region(&self) -> Option<CropRegion> {
        if self.target.is_empty() {
            return None;
        }
        CropRegion::covering(
            &self.rect,
            self.target.width.round() as u32,
            self.target.height.round() as u32,
        )
    }
}

/// Scale factor from the preview display rect to an image of `image_size`.
///
/// Horizontal and vertical factors are computed separately and only the
/// larger one is kept, matching aspect-fill cropping. Returns `None` when
/// the display rect is degenerate.
pub fn fill_scale(preview_display: &Rect, image_size: Size) -> Option<f64> {
    if preview_display.is_empty() || !preview_display.is_finite() {
        return None;
    }
    let factor_x = image_size.width / preview_display.width();
    let factor_y = image_size.height / preview_display.height();
    Some(factor_x.max(factor_y))
}

/// Map a rectangle in preview view coordinates into the pixel space of an
/// image of `image_size`.
///
/// No clamping happens here. When the display rect is degenerate the result
/// is an empty rect with a zero scale.
pub fn map_to_image(rect: &Rect, preview_display: &Rect, image_size: Size) -> MappedRect {
    let Some(scale) = fill_scale(preview_display, image_size) else {
        return MappedRect {
            rect: Rect::default(),
            target: image_size,
            scale: 0.0,
        };
    };

    let mapped = Rect::new(
        (rect.min_x() - preview_display.min_x()) * scale,
        (rect.min_y() - preview_display.min_y()) * scale,
        rect.width() * scale,
        rect.height() * scale,
    );

    MappedRect {
        rect: mapped,
        target: image_size,
        scale,
    }
}

/// Unit square of the camera feed placed in view coordinates under aspect fill.
pub fn preview_display_rect(view_bounds: Size, frame_size: Size) -> Rect {
    if view_bounds.is_empty() || frame_size.is_empty() {
        return Rect::from_size(view_bounds);
    }
    let scale = (view_bounds.width / frame_size.width).max(view_bounds.height / frame_size.height);
    let displayed = Size::new(frame_size.width * scale, frame_size.height * scale);
    Rect::centered_at(
        Point::new(view_bounds.width / 2.0, view_bounds.height / 2.0),
        displayed,
    )
}

/// Convert a unit-space detection box into preview view coordinates.
pub fn unit_to_preview(unit_rect: &Rect, preview_display: &Rect) -> Rect {
    Rect::new(
        preview_display.min_x() + unit_rect.min_x() * preview_display.width(),
        preview_display.min_y() + unit_rect.min_y() * preview_display.height(),
        unit_rect.width() * preview_display.width(),
        unit_rect.height() * preview_display.height(),
    )
    .standardized()
}
