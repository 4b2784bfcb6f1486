//! Plane geometry shared by the preview, the capture window and captured images.
//!
//! View and image space use `f64` with a top-left origin and y growing
//! downwards. Pixel regions handed to the cropper are `u32` [`CropRegion`]s.

use serde::{Deserialize, Serialize};

/// Values this close to an integer are treated as that integer when
/// converting to pixel regions.
const PIXEL_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a pixel buffer.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Rectangle with its origin at zero.
    pub fn from_size(size: Size) -> Self {
        Self {
            origin: Point::default(),
            size,
        }
    }

    /// Rectangle of `size` centred on `center`.
    pub fn centered_at(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        self.size.width * self.size.height
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.origin.x.is_finite()
            && self.origin.y.is_finite()
            && self.size.width.is_finite()
            && self.size.height.is_finite()
    }

    /// Inclusive containment: a rectangle contains itself.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x() >= self.min_x()
            && other.min_y() >= self.min_y()
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Same rectangle with negative extents folded into the origin.
    pub fn standardized(&self) -> Rect {
        let (x, width) = if self.size.width < 0.0 {
            (self.origin.x + self.size.width, -self.size.width)
        } else {
            (self.origin.x, self.size.width)
        };
        let (y, height) = if self.size.height < 0.0 {
            (self.origin.y + self.size.height, -self.size.height)
        } else {
            (self.origin.y, self.size.height)
        };
        Rect::new(x, y, width, height)
    }
}

/// Pixel-aligned crop region inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Smallest pixel region covering `rect`, provided it is non-empty and
    /// lies entirely within a `bounds_width` x `bounds_height` image.
    pub fn covering(rect: &Rect, bounds_width: u32, bounds_height: u32) -> Option<Self> {
        if !rect.is_finite() || rect.is_empty() {
            return None;
        }

        let x0 = snap_floor(rect.min_x());
        let y0 = snap_floor(rect.min_y());
        let x1 = snap_ceil(rect.max_x());
        let y1 = snap_ceil(rect.max_y());

        if x0 < 0.0 || y0 < 0.0 || x1 > bounds_width as f64 || y1 > bounds_height as f64 {
            return None;
        }
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

fn snap_floor(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < PIXEL_EPSILON {
        r
    } else {
        v.floor()
    }
}

fn snap_ceil(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < PIXEL_EPSILON {
        r
    } else {
        v.ceil()
    }
}
