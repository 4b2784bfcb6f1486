use crate::finish::ImageOrientation;
use crate::geometry::{Rect, Size};
use crate::window::CaptureMode;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which physical camera a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    Back,
}

impl CameraPosition {
    /// Camera a capture mode runs on.
    pub fn for_mode(mode: CaptureMode) -> Self {
        match mode {
            CaptureMode::Document => CameraPosition::Back,
            CaptureMode::Selfie => CameraPosition::Front,
        }
    }
}

/// A live video frame delivered for analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub sequence: u64,
    pub timestamp_us: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Frame {
    pub fn size(&self) -> Size {
        Size::from_pixels(self.width, self.height)
    }
}

/// One face reported by the detector for a frame.
///
/// `bounding_box` is in unit coordinates of the visible preview with a
/// top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bounding_box: Rect,
}

impl DetectionResult {
    pub fn new(bounding_box: Rect) -> Self {
        Self { bounding_box }
    }

    /// Build from a detector that reports boxes with a bottom-left origin.
    pub fn from_bottom_left(bounding_box: Rect) -> Self {
        let flipped = Rect::new(
            bounding_box.min_x(),
            1.0 - bounding_box.max_y(),
            bounding_box.width(),
            bounding_box.height(),
        );
        Self::new(flipped)
    }
}

/// The raw result of one shutter event.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// Decoded pixels as stored by the sensor, not yet rotated upright.
    pub image: DynamicImage,
    pub orientation: ImageOrientation,
    pub captured_at: DateTime<Utc>,
}

impl CaptureOutcome {
    pub fn new(image: DynamicImage, orientation: ImageOrientation) -> Self {
        Self {
            image,
            orientation,
            captured_at: Utc::now(),
        }
    }
}

/// Image handed back to the caller once a session succeeds.
#[derive(Debug, Clone)]
pub struct FinishedImage {
    pub session_id: Uuid,
    pub mode: CaptureMode,
    pub image: DynamicImage,
    /// False when the crop fell back to the whole upright image.
    pub cropped: bool,
    pub captured_at: DateTime<Utc>,
}

impl FinishedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn summary(&self) -> FinishedImageSummary {
        FinishedImageSummary {
            session_id: self.session_id,
            mode: self.mode,
            width: self.image.width(),
            height: self.image.height(),
            cropped: self.cropped,
            captured_at: self.captured_at,
        }
    }
}

/// Serializable description of a [`FinishedImage`], without pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedImageSummary {
    pub session_id: Uuid,
    pub mode: CaptureMode,
    pub width: u32,
    pub height: u32,
    pub cropped: bool,
    pub captured_at: DateTime<Utc>,
}
