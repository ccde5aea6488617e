//! Demo: scripted camera and decoder driving a full scan session.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use decode_pipeline::{CornerPoint, DecoderFactory, RawBarcode, ScriptedDecoder, ScriptedFactory};
use frame_capture::{BufferPool, Frame, MockCamera, PixelFormat, Rotation};
use scan_config::{BarcodeFormat, DisplayMetrics, DisplayOrientation, Quality, ScanOptions};
use scan_session::{ScanEvent, SessionConfig, SessionController};

const FRAME_INTERVAL_MS: u64 = 33;
const FRAME_COUNT: u64 = 60;

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn main() -> anyhow::Result<()> {
    init_logging();
    info!("=== Barcode Scan Pipeline demo v{} ===", env!("CARGO_PKG_VERSION"));

    let camera = MockCamera::new();
    let emitter = camera.emitter();

    let decoder = ScriptedDecoder::repeating(vec![RawBarcode {
        value: Some("4006381333931".into()),
        format: BarcodeFormat::Ean13,
        corner_points: vec![
            CornerPoint::new(120, 80),
            CornerPoint::new(520, 80),
            CornerPoint::new(520, 210),
            CornerPoint::new(120, 210),
        ],
    }]);
    let factory = Arc::new(ScriptedFactory::new(Arc::new(decoder)));

    let display = DisplayMetrics {
        width_px: 1080,
        height_px: 2400,
        orientation: DisplayOrientation::Portrait,
    };
    let mut controller = SessionController::new(
        Box::new(camera),
        factory as Arc<dyn DecoderFactory>,
        display,
        SessionConfig::default(),
    );

    let options = ScanOptions {
        formats: vec!["ean13".into(), "qrCode".into()],
        quality: Some(Quality::High),
        ..Default::default()
    };
    let mut info = controller.initialize(&options)?;
    info!(handle = %info.handle, resolution = %info.resolution, "session ready");

    let flash = controller.toggle_flash()?;
    info!(enabled = flash, "torch toggled");
    controller.touch_to_focus(0.5, 0.4)?;

    // Simulated capture thread: ~30 fps for two seconds.
    let producer = std::thread::spawn(move || {
        let pool = BufferPool::new(4, 4);
        let mut dropped = 0u64;
        for i in 0..FRAME_COUNT {
            match pool.acquire() {
                Some(mut buffer) => {
                    if buffer.fill_from(&[128u8; 4]).is_ok() {
                        emitter.emit(Frame::new(
                            buffer,
                            PixelFormat::Luma8,
                            Rotation::Deg90,
                            2,
                            2,
                            i * FRAME_INTERVAL_MS,
                        ));
                    }
                }
                None => dropped += 1,
            }
            std::thread::sleep(Duration::from_millis(FRAME_INTERVAL_MS));
        }
        info!(dropped, "capture simulation finished");
    });

    let mut detections = 0usize;
    while !producer.is_finished() {
        match info.events.try_recv() {
            Ok(ScanEvent::BarcodeDetected { barcodes }) => {
                detections += 1;
                for barcode in &barcodes {
                    info!(
                        value = %barcode.value,
                        format = barcode.format.as_str(),
                        corners = barcode.corner_points.len(),
                        "barcode detected"
                    );
                }
            }
            Err(_) => std::thread::sleep(Duration::from_millis(10)),
        }
    }
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("capture simulation panicked"))?;

    // Drain anything still in flight.
    std::thread::sleep(Duration::from_millis(200));
    while let Ok(ScanEvent::BarcodeDetected { .. }) = info.events.try_recv() {
        detections += 1;
    }

    controller.pause();
    controller.resume();
    controller.dispose();
    info!(detections, "demo complete");
    Ok(())
}
