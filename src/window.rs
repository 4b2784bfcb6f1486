//! Capture-window policy: the fixed on-screen guide a subject has to fit in.

use crate::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Document guide dimensions, in view units.
pub const DOCUMENT_WINDOW_SIZE: Size = Size::new(300.0, 200.0);
/// Rounded-corner radius of the document guide. Display only.
pub const DOCUMENT_CORNER_RADIUS: f64 = 20.0;
/// Selfie guide diameter, in view units.
pub const SELFIE_WINDOW_DIAMETER: f64 = 300.0;
/// A face box must cover strictly more than this many square view units.
pub const MIN_FACE_AREA: f64 = 50_000.0;

/// Which capture screen the window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Rear camera, rectangular guide, explicit shutter.
    Document,
    /// Front camera, circular guide, automatic shutter on a qualified face.
    Selfie,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Document => "document",
            CaptureMode::Selfie => "selfie",
        }
    }

    /// Whether the shutter is driven by face qualification.
    pub fn is_face_guided(&self) -> bool {
        matches!(self, CaptureMode::Selfie)
    }
}

impl std::str::FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" | "photo" => Ok(CaptureMode::Document),
            "selfie" => Ok(CaptureMode::Selfie),
            other => Err(format!("unknown capture mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WindowShape {
    Rectangle { corner_radius: f64 },
    Ellipse,
}

/// The guide region inside the preview view. Immutable once built; build a
/// new one if the container is resized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureWindow {
    pub mode: CaptureMode,
    pub bounds: Rect,
    pub shape: WindowShape,
}

impl CaptureWindow {
    /// Guide for `mode`, centred in `container`.
    pub fn for_mode(mode: CaptureMode, container: Rect) -> Self {
        let center = container.center();
        match mode {
            CaptureMode::Document => Self {
                mode,
                bounds: Rect::centered_at(center, DOCUMENT_WINDOW_SIZE),
                shape: WindowShape::Rectangle {
                    corner_radius: DOCUMENT_CORNER_RADIUS,
                },
            },
            CaptureMode::Selfie => Self {
                mode,
                bounds: Rect::centered_at(
                    center,
                    Size::new(SELFIE_WINDOW_DIAMETER, SELFIE_WINDOW_DIAMETER),
                ),
                shape: WindowShape::Ellipse,
            },
        }
    }

    /// Axis-aligned containment against the window's bounding box. Ellipses
    /// are approximated by their bounding box.
    pub fn contains(&self, detection: &Rect) -> bool {
        self.bounds.contains_rect(detection)
    }

    /// Area of a detection box in view units.
    pub fn area(&self, detection: &Rect) -> f64 {
        detection.area()
    }

    /// A face is in position when it is inside the window and large enough.
    pub fn qualifies(&self, detection: &Rect) -> bool {
        self.contains(detection) && self.area(detection) > MIN_FACE_AREA
    }
}
