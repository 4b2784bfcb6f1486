//! In-memory camera and detector backends.

use super::synthetic_data::{synthetic_photo, synthetic_video_frame};
use crate::backend::{CameraBackend, FaceDetector};
use crate::errors::CaptureError;
use crate::finish::ImageOrientation;
use crate::geometry::Size;
use crate::types::{CameraPosition, CaptureOutcome, DetectionResult, Frame};
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Camera that produces gradient frames and photos on demand.
#[derive(Debug)]
pub struct SyntheticCamera {
    position: CameraPosition,
    frame_size: (u32, u32),
    photo_size: (u32, u32),
    orientation: ImageOrientation,
    frame_interval: Duration,
    frame_limit: Option<u64>,
    has_torch: bool,
    fail_capture: bool,
    empty_photo: bool,
    streaming: AtomicBool,
    torch: AtomicBool,
    next_sequence: AtomicU64,
    captures: AtomicUsize,
    stream_starts: AtomicUsize,
}

impl SyntheticCamera {
    pub fn new(position: CameraPosition) -> Self {
        Self {
            position,
            frame_size: (48, 64),
            photo_size: (1440, 1080),
            orientation: ImageOrientation::Right,
            frame_interval: Duration::from_millis(1),
            frame_limit: None,
            has_torch: matches!(position, CameraPosition::Back),
            fail_capture: false,
            empty_photo: false,
            streaming: AtomicBool::new(false),
            torch: AtomicBool::new(false),
            next_sequence: AtomicU64::new(0),
            captures: AtomicUsize::new(0),
            stream_starts: AtomicUsize::new(0),
        }
    }

    pub fn front() -> Self {
        Self::new(CameraPosition::Front)
    }

    pub fn back() -> Self {
        Self::new(CameraPosition::Back)
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    /// Stored (pre-rotation) photo size and orientation tag.
    pub fn with_photo(mut self, width: u32, height: u32, orientation: ImageOrientation) -> Self {
        self.photo_size = (width, height);
        self.orientation = orientation;
        self
    }

    /// The feed fails after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_torch(mut self, has_torch: bool) -> Self {
        self.has_torch = has_torch;
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    /// Photos come back with no pixels.
    pub fn empty_photos(mut self) -> Self {
        self.empty_photo = true;
        self
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn frames_delivered(&self) -> u64 {
        self.next_sequence.load(Ordering::SeqCst)
    }

    pub fn stream_starts(&self) -> usize {
        self.stream_starts.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    pub fn torch_lit(&self) -> bool {
        self.torch.load(Ordering::SeqCst)
    }
}

impl CameraBackend for SyntheticCamera {
    fn position(&self) -> CameraPosition {
        self.position
    }

    fn frame_size(&self) -> Size {
        Size::from_pixels(self.frame_size.0, self.frame_size.1)
    }

    fn start_stream(&self) -> Result<(), CaptureError> {
        self.streaming.store(true, Ordering::SeqCst);
        self.stream_starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_stream(&self) -> Result<(), CaptureError> {
        self.streaming.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn next_frame(&self, timeout: Duration) -> Result<Option<Frame>, CaptureError> {
        if !self.is_streaming() {
            return Err(CaptureError::capture("stream is not running"));
        }
        if self.frame_interval > timeout {
            std::thread::sleep(timeout);
            return Ok(None);
        }
        std::thread::sleep(self.frame_interval);

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        if self.frame_limit.is_some_and(|limit| sequence >= limit) {
            return Err(CaptureError::capture("synthetic feed exhausted"));
        }
        Ok(Some(synthetic_video_frame(
            sequence,
            self.frame_size.0,
            self.frame_size.1,
        )))
    }

    fn capture_photo(&self) -> Result<CaptureOutcome, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail_capture {
            return Err(CaptureError::capture("synthetic shutter failure"));
        }
        let image = if self.empty_photo {
            DynamicImage::new_rgb8(0, 0)
        } else {
            synthetic_photo(self.photo_size.0, self.photo_size.1)
        };
        Ok(CaptureOutcome::new(image, self.orientation))
    }

    fn has_torch(&self) -> bool {
        self.has_torch
    }

    fn set_torch(&self, on: bool) -> Result<(), CaptureError> {
        if !self.has_torch {
            return Err(CaptureError::unavailable("torch"));
        }
        self.torch.store(on, Ordering::SeqCst);
        Ok(())
    }
}

/// One scripted detector answer.
#[derive(Debug, Clone)]
pub enum DetectionStep {
    Faces(Vec<DetectionResult>),
    Fail,
}

/// Detector that replays a script, one step per call. The last step repeats.
#[derive(Debug)]
pub struct ScriptedDetector {
    steps: Vec<DetectionStep>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(steps: Vec<DetectionStep>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reports the same faces on every frame.
    pub fn always(faces: Vec<DetectionResult>) -> Self {
        Self::new(vec![DetectionStep::Faces(faces)])
    }

    /// Never sees a face.
    pub fn never() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<DetectionResult>, CaptureError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.get(call).or_else(|| self.steps.last());
        match step {
            Some(DetectionStep::Faces(faces)) => Ok(faces.clone()),
            Some(DetectionStep::Fail) => Err(CaptureError::detection("scripted failure")),
            None => Ok(Vec::new()),
        }
    }
}
