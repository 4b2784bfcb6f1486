//! guidecam: guided document and selfie capture
//!
//! This crate holds the camera-independent core of a two-shot capture flow:
//! a document photo on the rear camera, then a selfie on the front camera
//! that fires automatically once a face sits inside an on-screen guide.
//!
//! # Features
//! - Fixed capture windows (300x200 document guide, 300 diameter selfie guide)
//! - Face qualification with a race-free one-shot capture latch
//! - Aspect-fill mapping from preview coordinates to captured pixels
//! - Upright normalization and cropping of captured photos
//! - Session lifecycle with background analysis and foreground delivery
//!
//! Platform camera and face-detection code plug in through the
//! [`CameraBackend`] and [`FaceDetector`] traits.
//!
//! # Usage
//! ```rust,ignore
//! use guidecam::{CaptureFlow, GuideCamConfig, Size};
//!
//! let flow = CaptureFlow::new(rear, front, detector, GuideCamConfig::load_or_default());
//! let selfie = flow.capture_selfie(Size::new(390.0, 844.0)).await?;
//! ```
pub mod backend;
pub mod config;
pub mod errors;
pub mod finish;
pub mod flow;
pub mod geometry;
pub mod mapper;
pub mod qualify;
pub mod session;
pub mod types;
pub mod window;

// Testing utilities - synthetic backends for offline testing
pub mod testing;

// Re-exports for convenience
pub use backend::{CameraBackend, FaceDetector};
pub use config::GuideCamConfig;
pub use errors::CaptureError;
pub use finish::{finish, normalize_orientation, ImageOrientation};
pub use flow::{CaptureFlow, FlowResults, ShutterEvent};
pub use geometry::{CropRegion, Point, Rect, Size};
pub use mapper::{map_to_image, MappedRect};
pub use qualify::{CaptureLatch, Evaluation, LatchState, QualificationEvaluator};
pub use session::{run_guided_capture, CaptureSession, SessionConfig};
pub use types::{CameraPosition, CaptureOutcome, DetectionResult, FinishedImage, Frame};
pub use window::{CaptureMode, CaptureWindow, WindowShape};

/// Initialize logging, defaulting to `guidecam=<level>` when RUST_LOG is unset
pub fn init_logging() {
    init_logging_with_level("info");
}

pub fn init_logging_with_level(level: &str) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", format!("guidecam={}", level));
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
