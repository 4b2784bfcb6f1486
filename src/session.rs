use crate::backend::{CameraBackend, FaceDetector};
use crate::config::GuideCamConfig;
use crate::errors::CaptureError;
use crate::finish::finish_capture;
use crate::geometry::{Rect, Size};
use crate::mapper::preview_display_rect;
use crate::qualify::{CaptureLatch, Evaluation, LatchState, QualificationEvaluator};
use crate::types::{CameraPosition, DetectionResult, FinishedImage, Frame};
use crate::window::{CaptureMode, CaptureWindow};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Started,
    Stopped,
}

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: CaptureMode,
    /// Size of the preview view hosting the feed and the guide.
    pub view_size: Size,
    pub frame_timeout: Duration,
    pub analysis_concurrency: usize,
    pub capture_timeout: Duration,
}

impl SessionConfig {
    pub fn new(mode: CaptureMode, view_size: Size) -> Self {
        Self::from_config(mode, view_size, &GuideCamConfig::default())
    }

    pub fn from_config(mode: CaptureMode, view_size: Size, config: &GuideCamConfig) -> Self {
        Self {
            mode,
            view_size,
            frame_timeout: config.session.frame_timeout(),
            analysis_concurrency: config.session.analysis_concurrency.max(1),
            capture_timeout: config.session.capture_timeout(),
        }
    }
}

/// One visit to a capture screen.
///
/// The session owns its camera for its whole lifetime. It is started once,
/// captures at most once and is stopped once; a new visit needs a new session.
pub struct CaptureSession {
    id: Uuid,
    config: SessionConfig,
    window: CaptureWindow,
    preview_display: Rect,
    evaluator: QualificationEvaluator,
    latch: CaptureLatch,
    state: Mutex<SessionState>,
    camera: Arc<dyn CameraBackend>,
    torch_on: AtomicBool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("mode", &self.config.mode)
            .field("window", &self.window.bounds)
            .field("preview_display", &self.preview_display)
            .field("latch", &self.latch.state())
            .finish()
    }
}

impl CaptureSession {
    pub fn open(
        config: SessionConfig,
        camera: Arc<dyn CameraBackend>,
    ) -> Result<Self, CaptureError> {
        let wanted = CameraPosition::for_mode(config.mode);
        if camera.position() != wanted {
            return Err(CaptureError::unavailable(format!(
                "{} capture needs the {:?} camera, got {:?}",
                config.mode.as_str(),
                wanted,
                camera.position()
            )));
        }
        if config.view_size.is_empty() {
            return Err(CaptureError::InvalidGeometry(format!(
                "preview view size {}x{} is empty",
                config.view_size.width, config.view_size.height
            )));
        }

        let container = Rect::from_size(config.view_size);
        let window = CaptureWindow::for_mode(config.mode, container);
        let preview_display = preview_display_rect(config.view_size, camera.frame_size());
        let id = Uuid::new_v4();

        log::info!(
            "Opened {} session {} (window {:?}, preview {:?})",
            config.mode.as_str(),
            id,
            window.bounds,
            preview_display
        );

        Ok(Self {
            id,
            evaluator: QualificationEvaluator::new(window, preview_display),
            config,
            window,
            preview_display,
            latch: CaptureLatch::new(),
            state: Mutex::new(SessionState::Open),
            camera,
            torch_on: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CaptureMode {
        self.config.mode
    }

    pub fn window(&self) -> &CaptureWindow {
        &self.window
    }

    pub fn preview_display(&self) -> Rect {
        self.preview_display
    }

    pub fn latch_state(&self) -> LatchState {
        self.latch.state()
    }

    pub fn is_running(&self) -> bool {
        self.current_state() == SessionState::Started
    }

    /// Start the camera stream and arm the capture latch.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        match *state {
            SessionState::Started => return Err(CaptureError::AlreadyStarted),
            SessionState::Stopped => return Err(CaptureError::Stopped),
            SessionState::Open => {}
        }

        self.camera.start_stream()?;
        self.latch.rearm();
        *state = SessionState::Started;
        log::info!("Started session {}", self.id);
        Ok(())
    }

    /// Tear the session down. Triggers are blocked before the stream stops,
    /// so in-flight analyses cannot fire a capture.
    pub fn stop(&self) -> Result<(), CaptureError> {
        self.latch.tear_down();

        let mut state = self.state.lock().map_err(|_| poisoned())?;
        match *state {
            SessionState::Stopped => return Err(CaptureError::Stopped),
            SessionState::Open => {}
            SessionState::Started => {
                if self.torch_on.swap(false, Ordering::AcqRel) {
                    if let Err(e) = self.camera.set_torch(false) {
                        log::warn!("Failed to switch torch off: {}", e);
                    }
                }
                if let Err(e) = self.camera.stop_stream() {
                    log::warn!("Error stopping camera stream for session {}: {}", self.id, e);
                }
            }
        }
        *state = SessionState::Stopped;
        log::info!("Stopped session {}", self.id);
        Ok(())
    }

    /// Run the qualification policy over one frame's detections.
    pub fn evaluate_detections(&self, detections: &[DetectionResult]) -> Evaluation {
        if !self.is_running() {
            return Evaluation::Suppressed;
        }
        self.evaluator.evaluate(&self.latch, detections)
    }

    /// Detect faces in `frame` and evaluate them.
    pub fn analyze_frame(
        &self,
        frame: &Frame,
        detector: &dyn FaceDetector,
    ) -> Result<Evaluation, CaptureError> {
        if self.latch.state() != LatchState::Watching {
            return Ok(Evaluation::Suppressed);
        }
        let detections = detector.detect(frame)?;
        Ok(self.evaluate_detections(&detections))
    }

    /// Explicit shutter. Allowed once per session.
    pub async fn take_photo(&self) -> Result<FinishedImage, CaptureError> {
        self.ensure_started()?;
        if !self.latch.try_trigger() {
            return Err(match self.latch.state() {
                LatchState::TornDown => CaptureError::Stopped,
                _ => CaptureError::AlreadyCaptured,
            });
        }
        self.shoot().await
    }

    /// Capture a photo and finish it off the async workers.
    async fn shoot(&self) -> Result<FinishedImage, CaptureError> {
        self.ensure_started()?;

        let camera = self.camera.clone();
        let session_id = self.id;
        let window = self.window;
        let preview_display = self.preview_display;

        let work = async move {
            let outcome = tokio::task::spawn_blocking(move || camera.capture_photo()).await??;
            if outcome.image.width() == 0 || outcome.image.height() == 0 {
                return Err(CaptureError::NoImageData);
            }
            log::debug!(
                "Session {} captured {}x{} photo ({:?})",
                session_id,
                outcome.image.width(),
                outcome.image.height(),
                outcome.orientation
            );
            let finished = tokio::task::spawn_blocking(move || {
                finish_capture(outcome, session_id, &window, &preview_display)
            })
            .await?;
            Ok::<FinishedImage, CaptureError>(finished)
        };

        match tokio::time::timeout(self.config.capture_timeout, work).await {
            Ok(Ok(finished)) => {
                log::info!(
                    "Session {} finished {}x{} image (cropped: {})",
                    self.id,
                    finished.image.width(),
                    finished.image.height(),
                    finished.cropped
                );
                Ok(finished)
            }
            Ok(Err(e)) => {
                log::error!("Session {} capture failed: {}", self.id, e);
                Err(e)
            }
            Err(_) => {
                log::error!("Session {} capture timed out", self.id);
                Err(CaptureError::Timeout(format!(
                    "capture did not finish within {:?}",
                    self.config.capture_timeout
                )))
            }
        }
    }

    /// Flip the torch. Returns the new torch state.
    pub fn toggle_torch(&self) -> Result<bool, CaptureError> {
        self.ensure_started()?;
        if !self.camera.has_torch() {
            log::warn!("Torch is not available on the {:?} camera", self.camera.position());
            return Err(CaptureError::unavailable("torch"));
        }
        let on = !self.torch_on.load(Ordering::Acquire);
        self.camera.set_torch(on).map_err(|e| {
            log::warn!("Torch could not be used: {}", e);
            e
        })?;
        self.torch_on.store(on, Ordering::Release);
        Ok(on)
    }

    pub fn torch_on(&self) -> bool {
        self.torch_on.load(Ordering::Acquire)
    }

    fn ensure_started(&self) -> Result<(), CaptureError> {
        match self.current_state() {
            SessionState::Started => Ok(()),
            SessionState::Open => Err(CaptureError::NotStarted),
            SessionState::Stopped => Err(CaptureError::Stopped),
        }
    }

    fn current_state(&self) -> SessionState {
        match self.state.lock() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.current_state() != SessionState::Stopped {
            if let Err(e) = self.stop() {
                log::warn!("Error stopping session {} in drop: {}", self.id, e);
            }
        }
    }
}

fn poisoned() -> CaptureError {
    CaptureError::capture("session lock poisoned by previous panic")
}

/// Watch the live feed and shoot as soon as a face is in position.
///
/// Frames are pulled on the blocking pool and each one is analysed in its
/// own blocking task, so a new frame can arrive while earlier ones are still
/// being analysed. Frames beyond `analysis_concurrency` are dropped. The
/// first qualifying frame wins the latch and hands its trigger to this task,
/// which then captures and finishes the photo.
pub async fn run_guided_capture(
    session: Arc<CaptureSession>,
    detector: Arc<dyn FaceDetector>,
) -> Result<FinishedImage, CaptureError> {
    if !session.mode().is_face_guided() {
        return Err(CaptureError::unavailable(format!(
            "face guidance in {} mode",
            session.mode().as_str()
        )));
    }
    session.ensure_started()?;

    let (trigger_tx, mut trigger_rx) = mpsc::channel::<Rect>(1);
    let mut pump = PumpGuard {
        session: session.clone(),
        pump: tokio::spawn(pump_frames(session.clone(), detector, trigger_tx)),
        completed: false,
    };

    let result = match trigger_rx.recv().await {
        Some(face) => {
            log::info!(
                "Session {}: face in position ({:.0}x{:.0}), capturing",
                session.id(),
                face.width(),
                face.height()
            );
            session.shoot().await
        }
        None => match session.latch_state() {
            LatchState::TornDown => Err(CaptureError::Stopped),
            _ => Err(CaptureError::capture(
                "video feed ended before a face qualified",
            )),
        },
    };

    pump.completed = true;
    result
}

/// Owns the frame pump of a guided capture.
///
/// The pump is aborted whenever the driver goes away. If the driver is
/// dropped before it completed, its caller is gone too, so the session is
/// torn down as well.
struct PumpGuard {
    session: Arc<CaptureSession>,
    pump: JoinHandle<()>,
    completed: bool,
}

impl Drop for PumpGuard {
    fn drop(&mut self) {
        self.pump.abort();
        if !self.completed && self.session.current_state() != SessionState::Stopped {
            log::info!(
                "Guided capture for session {} abandoned, tearing down",
                self.session.id()
            );
            if let Err(e) = self.session.stop() {
                log::warn!("Error stopping abandoned session {}: {}", self.session.id(), e);
            }
        }
    }
}

async fn pump_frames(
    session: Arc<CaptureSession>,
    detector: Arc<dyn FaceDetector>,
    trigger: mpsc::Sender<Rect>,
) {
    let analysis_slots = Arc::new(Semaphore::new(session.config.analysis_concurrency));
    let mut dropped: u64 = 0;

    while session.latch_state() == LatchState::Watching {
        let camera = session.camera.clone();
        let timeout = session.config.frame_timeout;
        let frame = match tokio::task::spawn_blocking(move || camera.next_frame(timeout)).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => continue,
            Ok(Err(e)) if e.is_recoverable() => {
                log::warn!("Session {}: skipping frame: {}", session.id(), e);
                continue;
            }
            Ok(Err(e)) => {
                log::error!("Session {}: video feed failed: {}", session.id(), e);
                break;
            }
            Err(e) => {
                log::error!("Session {}: frame task failed: {}", session.id(), e);
                break;
            }
        };

        let Ok(permit) = analysis_slots.clone().try_acquire_owned() else {
            dropped += 1;
            log::debug!("Dropping late frame {} ({} dropped)", frame.sequence, dropped);
            continue;
        };

        let session = session.clone();
        let detector = detector.clone();
        let trigger = trigger.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            match session.analyze_frame(&frame, detector.as_ref()) {
                Ok(Evaluation::Triggered { face }) => {
                    // Capacity 1 and a one-shot latch: this cannot be full.
                    let _ = trigger.try_send(face);
                }
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {
                    log::warn!("Dropping frame {}: {}", frame.sequence, e)
                }
                Err(e) => log::error!("Analysis of frame {} failed: {}", frame.sequence, e),
            }
        });
    }
}
