//! Document-then-selfie capture flow.
//!
//! The flow plays the part of the parent screen: it launches one capture
//! session at a time, keeps the latest finished photo and selfie, and hands
//! each result to an optional callback.

use crate::backend::{CameraBackend, FaceDetector};
use crate::config::GuideCamConfig;
use crate::errors::CaptureError;
use crate::geometry::Size;
use crate::session::{run_guided_capture, CaptureSession, SessionConfig};
use crate::types::FinishedImage;
use crate::window::CaptureMode;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Callback receiving every finished image.
pub type ResultSink = Box<dyn Fn(&FinishedImage) + Send + Sync>;

/// What the user did on the document screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterEvent {
    Capture,
    Cancel,
}

#[derive(Debug, Clone, Default)]
pub struct FlowResults {
    pub photo: Option<FinishedImage>,
    pub selfie: Option<FinishedImage>,
}

pub struct CaptureFlow {
    rear: Arc<dyn CameraBackend>,
    front: Arc<dyn CameraBackend>,
    detector: Arc<dyn FaceDetector>,
    config: GuideCamConfig,
    camera_slot: tokio::sync::Mutex<()>,
    active: Mutex<Option<Arc<CaptureSession>>>,
    results: Mutex<FlowResults>,
    sink: Option<ResultSink>,
}

impl CaptureFlow {
    pub fn new(
        rear: Arc<dyn CameraBackend>,
        front: Arc<dyn CameraBackend>,
        detector: Arc<dyn FaceDetector>,
        config: GuideCamConfig,
    ) -> Self {
        Self {
            rear,
            front,
            detector,
            config,
            camera_slot: tokio::sync::Mutex::new(()),
            active: Mutex::new(None),
            results: Mutex::new(FlowResults::default()),
            sink: None,
        }
    }

    pub fn with_result_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&FinishedImage) + Send + Sync + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Rear-camera document capture. The session stays live until `shutter`
    /// resolves.
    pub async fn capture_document<S>(
        &self,
        view_size: Size,
        shutter: S,
    ) -> Result<FinishedImage, CaptureError>
    where
        S: Future<Output = ShutterEvent>,
    {
        let _slot = self.camera_slot.try_lock().map_err(|_| CaptureError::Busy)?;
        let screen = self.begin(CaptureMode::Document, view_size, self.rear.clone())?;

        let result = match shutter.await {
            ShutterEvent::Capture => screen.session.take_photo().await,
            ShutterEvent::Cancel => {
                log::info!("Document capture cancelled");
                Err(CaptureError::Stopped)
            }
        };

        drop(screen);
        self.deliver(result?)
    }

    /// Front-camera selfie capture, fired by face qualification.
    pub async fn capture_selfie(&self, view_size: Size) -> Result<FinishedImage, CaptureError> {
        let _slot = self.camera_slot.try_lock().map_err(|_| CaptureError::Busy)?;
        let screen = self.begin(CaptureMode::Selfie, view_size, self.front.clone())?;

        let result = run_guided_capture(screen.session.clone(), self.detector.clone()).await;

        drop(screen);
        self.deliver(result?)
    }

    /// Tear down whichever session is live, as when its screen disappears.
    pub fn cancel(&self) -> Result<(), CaptureError> {
        let active = self.lock_active().clone();
        match active {
            Some(session) => session.stop(),
            None => Err(CaptureError::NotStarted),
        }
    }

    pub fn toggle_torch(&self) -> Result<bool, CaptureError> {
        let active = self.lock_active().clone();
        active.ok_or(CaptureError::NotStarted)?.toggle_torch()
    }

    /// Mode of the live session, if any.
    pub fn active_mode(&self) -> Option<CaptureMode> {
        self.lock_active().as_ref().map(|s| s.mode())
    }

    pub fn results(&self) -> FlowResults {
        self.lock_results().clone()
    }

    fn begin(
        &self,
        mode: CaptureMode,
        view_size: Size,
        camera: Arc<dyn CameraBackend>,
    ) -> Result<ActiveScreen<'_>, CaptureError> {
        let config = SessionConfig::from_config(mode, view_size, &self.config);
        let session = Arc::new(CaptureSession::open(config, camera)?);
        session.start()?;
        *self.lock_active() = Some(session.clone());
        Ok(ActiveScreen {
            flow: self,
            session,
        })
    }

    fn end(&self, session: &CaptureSession) {
        self.lock_active().take();
        if session.is_running() {
            if let Err(e) = session.stop() {
                log::warn!("Error stopping session {}: {}", session.id(), e);
            }
        }
    }

    fn deliver(&self, image: FinishedImage) -> Result<FinishedImage, CaptureError> {
        {
            let mut results = self.lock_results();
            match image.mode {
                CaptureMode::Document => results.photo = Some(image.clone()),
                CaptureMode::Selfie => results.selfie = Some(image.clone()),
            }
        }
        if let Some(sink) = &self.sink {
            sink(&image);
        }
        Ok(image)
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<Arc<CaptureSession>>> {
        self.active.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_results(&self) -> std::sync::MutexGuard<'_, FlowResults> {
        self.results.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// The live session of a capture screen. Dropping it ends the visit, also
/// when the capture future itself is dropped before completing.
struct ActiveScreen<'a> {
    flow: &'a CaptureFlow,
    session: Arc<CaptureSession>,
}

impl Drop for ActiveScreen<'_> {
    fn drop(&mut self) {
        self.flow.end(&self.session);
    }
}
