//! Testing utilities for guidecam
//!
//! Synthetic camera, scripted face detector and generated images for
//! exercising sessions without hardware.

pub mod fakes;
pub mod synthetic_data;

pub use fakes::{DetectionStep, ScriptedDetector, SyntheticCamera};
pub use synthetic_data::{detection_for_view_rect, synthetic_photo, synthetic_video_frame};
