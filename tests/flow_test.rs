//! Document-then-selfie flow tests

use guidecam::geometry::{Rect, Size};
use guidecam::mapper::preview_display_rect;
use guidecam::testing::{detection_for_view_rect, ScriptedDetector, SyntheticCamera};
use guidecam::{
    CameraBackend, CaptureError, CaptureFlow, CaptureMode, CaptureWindow, GuideCamConfig,
    ShutterEvent,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const VIEW: Size = Size::new(390.0, 844.0);

struct Rig {
    rear: Arc<SyntheticCamera>,
    front: Arc<SyntheticCamera>,
    detector: Arc<ScriptedDetector>,
}

impl Rig {
    fn with_face() -> Self {
        let front = Arc::new(SyntheticCamera::front());
        let display = preview_display_rect(VIEW, front.frame_size());
        let guide = CaptureWindow::for_mode(CaptureMode::Selfie, Rect::from_size(VIEW));
        let face = Rect::centered_at(guide.bounds.center(), Size::new(240.0, 240.0));
        Self {
            rear: Arc::new(SyntheticCamera::back()),
            front,
            detector: Arc::new(ScriptedDetector::always(vec![detection_for_view_rect(
                face, display,
            )])),
        }
    }

    fn without_face() -> Self {
        Self {
            rear: Arc::new(SyntheticCamera::back()),
            front: Arc::new(SyntheticCamera::front()),
            detector: Arc::new(ScriptedDetector::never()),
        }
    }

    fn flow(&self) -> CaptureFlow {
        CaptureFlow::new(
            self.rear.clone(),
            self.front.clone(),
            self.detector.clone(),
            GuideCamConfig::default(),
        )
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_photo_then_selfie_are_handed_back() {
    let rig = Rig::with_face();
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    let flow = rig.flow().with_result_sink(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let photo = flow
        .capture_document(VIEW, async { ShutterEvent::Capture })
        .await
        .unwrap();
    let selfie = flow.capture_selfie(VIEW).await.unwrap();

    let results = flow.results();
    assert_eq!(results.photo.unwrap().session_id, photo.session_id);
    assert_eq!(results.selfie.unwrap().session_id, selfie.session_id);
    assert_ne!(photo.session_id, selfie.session_id);
    assert_eq!(delivered.load(Ordering::SeqCst), 2);

    // Each screen released its camera.
    assert!(!rig.rear.is_streaming());
    assert!(!rig.front.is_streaming());
    assert_eq!(flow.active_mode(), None);
}

#[tokio::test]
async fn test_one_session_at_a_time() {
    let rig = Rig::with_face();
    let flow = rig.flow();
    let (tx, rx) = oneshot::channel();

    let (photo, selfie, mode_while_open) = tokio::join!(
        flow.capture_document(VIEW, async move { rx.await.unwrap_or(ShutterEvent::Cancel) }),
        async {
            tokio::task::yield_now().await;
            flow.capture_selfie(VIEW).await
        },
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let mode = flow.active_mode();
            tx.send(ShutterEvent::Capture).unwrap();
            mode
        }
    );

    assert!(photo.is_ok());
    assert_eq!(selfie.unwrap_err(), CaptureError::Busy);
    assert_eq!(mode_while_open, Some(CaptureMode::Document));
    assert_eq!(rig.front.stream_starts(), 0);
}

#[tokio::test]
async fn test_backing_out_of_document_screen() {
    let rig = Rig::with_face();
    let flow = rig.flow();

    let result = flow
        .capture_document(VIEW, async { ShutterEvent::Cancel })
        .await;

    assert_eq!(result.unwrap_err(), CaptureError::Stopped);
    assert!(flow.results().photo.is_none());
    assert_eq!(rig.rear.capture_count(), 0);
    assert!(!rig.rear.is_streaming());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_tears_down_selfie_screen() {
    let rig = Rig::without_face();
    let flow = rig.flow();

    let (selfie, cancelled) = tokio::join!(flow.capture_selfie(VIEW), async {
        tokio::time::sleep(Duration::from_millis(40)).await;
        flow.cancel()
    });

    assert!(cancelled.is_ok());
    assert_eq!(selfie.unwrap_err(), CaptureError::Stopped);
    assert!(flow.results().selfie.is_none());
    assert_eq!(rig.front.capture_count(), 0);
}

#[tokio::test]
async fn test_torch_follows_active_screen() {
    let rig = Rig::with_face();
    let flow = rig.flow();
    assert_eq!(flow.toggle_torch().unwrap_err(), CaptureError::NotStarted);

    let (tx, rx) = oneshot::channel();
    let (photo, torch) = tokio::join!(
        flow.capture_document(VIEW, async move { rx.await.unwrap_or(ShutterEvent::Cancel) }),
        async {
            tokio::task::yield_now().await;
            let torch = flow.toggle_torch();
            tx.send(ShutterEvent::Capture).unwrap();
            torch
        }
    );

    assert!(photo.is_ok());
    assert_eq!(torch, Ok(true));
    assert!(!rig.rear.torch_lit());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_selfie_screen_can_be_revisited() {
    let rig = Rig::with_face();
    let flow = rig.flow();

    let first = flow.capture_selfie(VIEW).await.unwrap();
    let second = flow.capture_selfie(VIEW).await.unwrap();

    // Let any in-flight analyses drain before counting.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(rig.front.capture_count(), 2);
    assert_eq!(rig.front.stream_starts(), 2);
    assert_eq!(flow.results().selfie.unwrap().session_id, second.session_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_selfie_screen_releases_camera() {
    let rig = Rig {
        rear: Arc::new(SyntheticCamera::back()),
        front: Arc::new(SyntheticCamera::front().with_frame_interval(Duration::from_millis(2))),
        detector: Arc::new(ScriptedDetector::never()),
    };
    let flow = rig.flow();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), flow.capture_selfie(VIEW)).await;
    assert!(abandoned.is_err());
    assert_eq!(flow.active_mode(), None);
    assert!(!rig.front.is_streaming());

    // Once the last in-flight frame request drains, the feed stays quiet.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let frames = rig.front.frames_delivered();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.front.frames_delivered(), frames);

    // The camera is free for the next visit.
    let again = tokio::time::timeout(Duration::from_millis(30), flow.capture_selfie(VIEW)).await;
    assert!(again.is_err());
    assert_eq!(rig.front.stream_starts(), 2);
    assert!(!rig.front.is_streaming());
    assert_eq!(rig.front.capture_count(), 0);
}

#[tokio::test]
async fn test_abandoned_document_screen_releases_camera() {
    let rig = Rig::with_face();
    let flow = rig.flow();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        flow.capture_document(VIEW, std::future::pending()),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(flow.active_mode(), None);
    assert!(!rig.rear.is_streaming());
    assert_eq!(rig.rear.capture_count(), 0);

    let photo = flow
        .capture_document(VIEW, async { ShutterEvent::Capture })
        .await;
    assert!(photo.is_ok());
    assert_eq!(rig.rear.stream_starts(), 2);
    assert_eq!(rig.rear.capture_count(), 1);
}
