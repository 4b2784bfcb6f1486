//! Face qualification: decide when a detected face is in position and fire
//! the capture exactly once per session.

use crate::geometry::Rect;
use crate::mapper::unit_to_preview;
use crate::types::DetectionResult;
use crate::window::CaptureWindow;
use std::sync::atomic::{AtomicU8, Ordering};

const WATCHING: u8 = 0;
const CAPTURED: u8 = 1;
const TORN_DOWN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    /// Armed: the first qualifying frame may trigger a capture.
    Watching,
    /// The capture for this session has been triggered.
    Captured,
    /// The session is being torn down. Nothing may trigger any more.
    TornDown,
}

/// One-shot latch guarding the capture trigger.
///
/// Transitions are compare-and-set so that concurrent frame analyses cannot
/// both win. Only `Watching -> Captured` fires a capture.
#[derive(Debug)]
pub struct CaptureLatch {
    state: AtomicU8,
}

impl Default for CaptureLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureLatch {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(WATCHING),
        }
    }

    pub fn state(&self) -> LatchState {
        match self.state.load(Ordering::Acquire) {
            WATCHING => LatchState::Watching,
            CAPTURED => LatchState::Captured,
            _ => LatchState::TornDown,
        }
    }

    /// Returns true for exactly one caller per session.
    pub fn try_trigger(&self) -> bool {
        self.state
            .compare_exchange(WATCHING, CAPTURED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Block all further triggers.
    pub fn tear_down(&self) {
        self.state.store(TORN_DOWN, Ordering::Release);
    }

    /// Re-arm for a freshly presented screen.
    pub(crate) fn rearm(&self) {
        self.state.store(WATCHING, Ordering::Release);
    }

    pub fn is_torn_down(&self) -> bool {
        self.state() == LatchState::TornDown
    }
}

/// What one analysed frame led to.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// This frame won the latch; `face` is the qualifying box in view coordinates.
    Triggered { face: Rect },
    /// Nothing qualified. Boxes are in view coordinates for overlay drawing.
    Watching { faces: Vec<Rect> },
    /// The latch is no longer armed; detections were ignored.
    Suppressed,
}

impl Evaluation {
    pub fn is_triggered(&self) -> bool {
        matches!(self, Evaluation::Triggered { .. })
    }
}

/// Applies the window policy to per-frame detections.
#[derive(Debug, Clone, Copy)]
pub struct QualificationEvaluator {
    window: CaptureWindow,
    preview_display: Rect,
}

impl QualificationEvaluator {
    pub fn new(window: CaptureWindow, preview_display: Rect) -> Self {
        Self {
            window,
            preview_display,
        }
    }

    pub fn window(&self) -> &CaptureWindow {
        &self.window
    }

    /// Convert a detection into view coordinates.
    pub fn to_view(&self, detection: &DetectionResult) -> Rect {
        unit_to_preview(&detection.bounding_box, &self.preview_display)
    }

    /// First qualifying detection of a frame, in view coordinates.
    pub fn first_qualifying(&self, detections: &[DetectionResult]) -> Option<Rect> {
        detections
            .iter()
            .map(|d| self.to_view(d))
            .find(|face| self.window.qualifies(face))
    }

    /// Evaluate one frame's detections against `latch`.
    pub fn evaluate(&self, latch: &CaptureLatch, detections: &[DetectionResult]) -> Evaluation {
        if latch.state() != LatchState::Watching {
            return Evaluation::Suppressed;
        }

        match self.first_qualifying(detections) {
            Some(face) => {
                if latch.try_trigger() {
                    log::debug!(
                        "Face qualified at ({:.1}, {:.1}) {:.1}x{:.1}",
                        face.min_x(),
                        face.min_y(),
                        face.width(),
                        face.height()
                    );
                    Evaluation::Triggered { face }
                } else {
                    Evaluation::Suppressed
                }
            }
            None => {
                if !detections.is_empty() {
                    log::trace!("{} face(s) outside the capture window", detections.len());
                }
                Evaluation::Watching {
                    faces: detections.iter().map(|d| self.to_view(d)).collect(),
                }
            }
        }
    }
}
