//! Collaborator seams: the camera layer and the face detector.
//!
//! Platform code implements these traits; [`crate::testing`] provides
//! synthetic implementations for offline use.

use crate::errors::CaptureError;
use crate::geometry::Size;
use crate::types::{CameraPosition, CaptureOutcome, DetectionResult, Frame};
use std::time::Duration;

/// A camera device with a live video output and a still-photo output.
///
/// Methods are blocking; sessions call them from the blocking pool.
pub trait CameraBackend: Send + Sync {
    fn position(&self) -> CameraPosition;

    /// Dimensions of video frames, used to place the feed in the preview.
    fn frame_size(&self) -> Size;

    fn start_stream(&self) -> Result<(), CaptureError>;

    fn stop_stream(&self) -> Result<(), CaptureError>;

    /// Next video frame, or `None` if none arrived within `timeout`.
    fn next_frame(&self, timeout: Duration) -> Result<Option<Frame>, CaptureError>;

    /// Expose and decode one still photo.
    fn capture_photo(&self) -> Result<CaptureOutcome, CaptureError>;

    fn has_torch(&self) -> bool {
        false
    }

    fn set_torch(&self, _on: bool) -> Result<(), CaptureError> {
        Err(CaptureError::unavailable("torch"))
    }
}

/// Source of per-frame face detections.
pub trait FaceDetector: Send + Sync {
    /// Faces in `frame`, in unit preview coordinates with a top-left origin.
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectionResult>, CaptureError>;
}
