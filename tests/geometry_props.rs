//! Property-Based Tests for capture-window geometry and coordinate mapping
//!
//! Run with: cargo test --test geometry_props

use guidecam::geometry::{Rect, Size};
use guidecam::mapper::{fill_scale, map_to_image, preview_display_rect, unit_to_preview};
use guidecam::window::MIN_FACE_AREA;
use guidecam::{CaptureMode, CaptureWindow};
use proptest::prelude::*;

fn selfie_window() -> CaptureWindow {
    CaptureWindow::for_mode(CaptureMode::Selfie, Rect::new(0.0, 0.0, 390.0, 844.0))
}

proptest! {
    /// INVARIANT: any box built inside the window bounds is contained
    #[test]
    fn inner_boxes_are_contained(
        dx in 0u32..=300,
        dy in 0u32..=300,
        fw in 0.0f64..=1.0,
        fh in 0.0f64..=1.0,
    ) {
        let window = selfie_window();
        let b = window.bounds;
        // Whole view units keep the sums exact.
        let w = (fw * (300 - dx) as f64).floor();
        let h = (fh * (300 - dy) as f64).floor();
        let probe = Rect::new(b.min_x() + dx as f64, b.min_y() + dy as f64, w, h);
        prop_assert!(window.contains(&probe));
    }

    /// INVARIANT: pushing any one edge past the window breaks containment
    #[test]
    fn any_edge_outside_breaks_containment(
        edge in 0usize..4,
        overshoot in 0.01f64..50.0,
    ) {
        let window = selfie_window();
        let b = window.bounds;
        let probe = match edge {
            0 => Rect::new(b.min_x() - overshoot, b.min_y(), b.width(), b.height()),
            1 => Rect::new(b.min_x(), b.min_y() - overshoot, b.width(), b.height()),
            2 => Rect::new(b.min_x(), b.min_y(), b.width() + overshoot, b.height()),
            _ => Rect::new(b.min_x(), b.min_y(), b.width(), b.height() + overshoot),
        };
        prop_assert!(!window.contains(&probe));
        prop_assert!(!window.qualifies(&probe));
    }

    /// INVARIANT: qualification is exactly containment plus area above the threshold
    #[test]
    fn qualification_matches_definition(
        x in 0.0f64..390.0,
        y in 0.0f64..844.0,
        w in 0.0f64..320.0,
        h in 0.0f64..320.0,
    ) {
        let window = selfie_window();
        let face = Rect::new(x, y, w, h);
        prop_assert_eq!(
            window.qualifies(&face),
            window.contains(&face) && w * h > MIN_FACE_AREA
        );
    }

    /// INVARIANT: mapping scales uniformly by the larger axis factor
    #[test]
    fn mapping_is_uniform(
        scale_x in 0.5f64..4.0,
        scale_y in 0.5f64..4.0,
        x in 0.0f64..300.0,
        y in 0.0f64..500.0,
    ) {
        let preview = Rect::new(0.0, 0.0, 390.0, 600.0);
        let image = Size::new(390.0 * scale_x, 600.0 * scale_y);
        let rect = Rect::new(x, y, 50.0, 80.0);
        let mapped = map_to_image(&rect, &preview, image);
        let factor = scale_x.max(scale_y);
        prop_assert!((mapped.scale - factor).abs() < 1e-9);
        prop_assert!((mapped.rect.width() / mapped.rect.height() - 50.0 / 80.0).abs() < 1e-9);
        prop_assert!((mapped.rect.min_x() - x * factor).abs() < 1e-6);
    }

    /// INVARIANT: with matching aspect ratios the mapped window stays inside the image
    #[test]
    fn matching_aspect_keeps_window_inside(
        view_w in 320.0f64..500.0,
        view_h in 640.0f64..1000.0,
        photo_w in 720u32..4000,
    ) {
        let frame = Size::new(3.0, 4.0);
        let view = Size::new(view_w, view_h);
        let display = preview_display_rect(view, frame);
        let window = CaptureWindow::for_mode(CaptureMode::Selfie, Rect::from_size(view));
        let photo = Size::new(photo_w as f64, photo_w as f64 * 4.0 / 3.0);
        let mapped = map_to_image(&window.bounds, &display, photo);
        prop_assert!(mapped.is_within_target());
        prop_assert!(mapped.crop_region().is_some());
    }

    /// INVARIANT: unit boxes land inside the preview display rect
    #[test]
    fn unit_boxes_stay_in_display(
        ux in 0.0f64..0.5,
        uy in 0.0f64..0.5,
        uw in 0.0f64..0.5,
        uh in 0.0f64..0.5,
    ) {
        let display = preview_display_rect(Size::new(390.0, 844.0), Size::new(480.0, 640.0));
        let view_box = unit_to_preview(&Rect::new(ux, uy, uw, uh), &display);
        prop_assert!(view_box.min_x() >= display.min_x() - 1e-9);
        prop_assert!(view_box.max_y() <= display.max_y() + 1e-9);
    }
}

#[test]
fn window_equal_box_is_contained() {
    let window = selfie_window();
    assert!(window.contains(&window.bounds));
}

#[test]
fn threshold_boundary() {
    let window = CaptureWindow::for_mode(CaptureMode::Document, Rect::new(0.0, 0.0, 400.0, 400.0));
    // Document window is 300x200: a full-window box has area 60000.
    assert!(window.qualifies(&window.bounds));
    assert!(!window.qualifies(&Rect::new(50.0, 100.0, 250.0, 200.0))); // 50000
    assert!(window.qualifies(&Rect::new(50.0, 100.0, 250.005, 200.0))); // 50001
}

#[test]
fn three_x_mapping_example() {
    let mapped = map_to_image(
        &Rect::new(45.0, 150.0, 300.0, 200.0),
        &Rect::new(0.0, 0.0, 390.0, 600.0),
        Size::new(1170.0, 1800.0),
    );
    assert_eq!(mapped.rect, Rect::new(135.0, 450.0, 900.0, 600.0));
}

#[test]
fn degenerate_preview_has_no_scale() {
    assert_eq!(fill_scale(&Rect::new(0.0, 0.0, 390.0, 0.0), Size::new(10.0, 10.0)), None);
}
