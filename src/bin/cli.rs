use anyhow::{anyhow, bail, Context, Result};
use guidecam::geometry::{Rect, Size};
use guidecam::mapper::{map_to_image, preview_display_rect};
use guidecam::testing::{detection_for_view_rect, ScriptedDetector, SyntheticCamera};
use guidecam::{CaptureFlow, CaptureMode, CaptureWindow, GuideCamConfig, ImageOrientation, ShutterEvent};
use std::env;
use std::sync::Arc;

const USAGE: &str = "Usage: guidecam-cli <command> [args]

Commands:
  window <document|selfie> <view_w> <view_h> [--json]
  map <x> <y> <w> <h> --preview <x> <y> <w> <h> --image <w> <h> [--json]
  qualify <document|selfie> <view_w> <view_h> <x> <y> <w> <h>
  finish <image> <document|selfie> <view_w> <view_h> [--orientation <name>] [--json]
  demo [--json]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = GuideCamConfig::load_or_default();
    guidecam::init_logging_with_level(&config.logging.level);

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let json = args.iter().any(|a| a == "--json");
    let command = &args[1];
    match command.as_str() {
        "window" => cmd_window(&args, json),
        "map" => cmd_map(&args, json),
        "qualify" => cmd_qualify(&args),
        "finish" => cmd_finish(&args, json),
        "demo" => cmd_demo(config, json).await,
        _ => {
            eprintln!("Unknown command: {}\n{USAGE}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_window(args: &[String], json: bool) -> Result<()> {
    let mode = parse_mode(arg(args, 2)?)?;
    let view = Size::new(parse_f64(args, 3)?, parse_f64(args, 4)?);
    let window = CaptureWindow::for_mode(mode, Rect::from_size(view));
    if json {
        println!("{}", serde_json::to_string(&window)?);
    } else {
        let b = window.bounds;
        println!(
            "{} window: origin ({}, {}) size {}x{} {:?}",
            mode.as_str(),
            b.min_x(),
            b.min_y(),
            b.width(),
            b.height(),
            window.shape
        );
    }
    Ok(())
}

fn cmd_map(args: &[String], json: bool) -> Result<()> {
    let rect = Rect::new(
        parse_f64(args, 2)?,
        parse_f64(args, 3)?,
        parse_f64(args, 4)?,
        parse_f64(args, 5)?,
    );
    let preview_at = flag_index(args, "--preview")?;
    let preview = Rect::new(
        parse_f64(args, preview_at + 1)?,
        parse_f64(args, preview_at + 2)?,
        parse_f64(args, preview_at + 3)?,
        parse_f64(args, preview_at + 4)?,
    );
    let image_at = flag_index(args, "--image")?;
    let image = Size::new(parse_f64(args, image_at + 1)?, parse_f64(args, image_at + 2)?);

    let mapped = map_to_image(&rect, &preview, image);
    if json {
        println!("{}", serde_json::to_string(&mapped)?);
    } else {
        let r = mapped.rect;
        println!(
            "({}, {}) {}x{} scale {} within image: {}",
            r.min_x(),
            r.min_y(),
            r.width(),
            r.height(),
            mapped.scale,
            mapped.is_within_target()
        );
    }
    Ok(())
}

fn cmd_qualify(args: &[String]) -> Result<()> {
    let mode = parse_mode(arg(args, 2)?)?;
    let view = Size::new(parse_f64(args, 3)?, parse_f64(args, 4)?);
    let face = Rect::new(
        parse_f64(args, 5)?,
        parse_f64(args, 6)?,
        parse_f64(args, 7)?,
        parse_f64(args, 8)?,
    );
    let window = CaptureWindow::for_mode(mode, Rect::from_size(view));
    println!(
        "contained: {} area: {} qualifies: {}",
        window.contains(&face),
        window.area(&face),
        window.qualifies(&face)
    );
    Ok(())
}

fn cmd_finish(args: &[String], json: bool) -> Result<()> {
    let path = arg(args, 2)?;
    let mode = parse_mode(arg(args, 3)?)?;
    let view = Size::new(parse_f64(args, 4)?, parse_f64(args, 5)?);
    let orientation = match args.iter().position(|a| a == "--orientation") {
        Some(i) => arg(args, i + 1)?
            .parse::<ImageOrientation>()
            .map_err(|e| anyhow!(e))?,
        None => ImageOrientation::Up,
    };

    let image = image::open(path).with_context(|| format!("failed to open {path}"))?;
    let upright_size = if orientation.swaps_axes() {
        Size::from_pixels(image.height(), image.width())
    } else {
        Size::from_pixels(image.width(), image.height())
    };

    // Treat the photo as the camera feed shown in the view.
    let preview = preview_display_rect(view, upright_size);
    let window = CaptureWindow::for_mode(mode, Rect::from_size(view));
    let (finished, cropped) = guidecam::finish(image, orientation, &window.bounds, &preview);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "width": finished.width(),
                "height": finished.height(),
                "cropped": cropped,
            })
        );
    } else {
        println!(
            "Finished: {}x{} (cropped: {})",
            finished.width(),
            finished.height(),
            cropped
        );
    }
    Ok(())
}

async fn cmd_demo(config: GuideCamConfig, json: bool) -> Result<()> {
    let [w, h] = config.preview.default_view_size;
    let view = Size::new(w, h);

    let rear = Arc::new(SyntheticCamera::back());
    let front = Arc::new(SyntheticCamera::front());

    // A face centred in the selfie guide, covering 240x240 view units.
    let display = preview_display_rect(view, guidecam::CameraBackend::frame_size(front.as_ref()));
    let guide = CaptureWindow::for_mode(CaptureMode::Selfie, Rect::from_size(view));
    let face = Rect::centered_at(guide.bounds.center(), Size::new(240.0, 240.0));
    let detector = Arc::new(ScriptedDetector::always(vec![detection_for_view_rect(face, display)]));

    let flow = CaptureFlow::new(rear, front, detector, config);
    let photo = flow
        .capture_document(view, async { ShutterEvent::Capture })
        .await?;
    let selfie = flow.capture_selfie(view).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string(&vec![photo.summary(), selfie.summary()])?
        );
    } else {
        for image in [&photo, &selfie] {
            let (w, h) = image.dimensions();
            println!(
                "{}: {}x{} (cropped: {}) session {}",
                image.mode.as_str(),
                w,
                h,
                image.cropped,
                image.session_id
            );
        }
    }
    Ok(())
}

fn arg(args: &[String], index: usize) -> Result<&str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument {index}\n{USAGE}"))
}

fn parse_f64(args: &[String], index: usize) -> Result<f64> {
    let raw = arg(args, index)?;
    raw.parse::<f64>()
        .with_context(|| format!("expected a number, got {raw:?}"))
}

fn parse_mode(raw: &str) -> Result<CaptureMode> {
    raw.parse::<CaptureMode>().map_err(|e| anyhow!(e))
}

fn flag_index(args: &[String], flag: &str) -> Result<usize> {
    match args.iter().position(|a| a == flag) {
        Some(i) => Ok(i),
        None => bail!("{flag} is required\n{USAGE}"),
    }
}
