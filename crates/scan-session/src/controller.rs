//! Session lifecycle and wiring.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use decode_pipeline::{DecodePipeline, DecoderFactory, DetectionResult};
use focus_control::{FocusConfig, FocusError, FocusScheduler};
use frame_capture::{CaptureConfig, Frame, FrameSink, FrameSource, Resolution};
use frame_gate::{FrameThrottle, PauseController};
use scan_config::{select_resolution, DeviceCapabilities, DisplayMetrics, ScanOptions};

use crate::events::ScanEvent;
use crate::SessionError;

/// Most devices deliver frames faster than decoding keeps up; four workers
/// saturate the decode capability without starving the host process.
const MAX_WORKER_THREADS: usize = 4;

/// Session-level timing and sizing knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum spacing between analyzed frames.
    pub min_analysis_interval_ms: u64,
    /// How long analysis stays suppressed after a reported detection.
    pub suppress_after_detection_ms: u64,
    pub focus: FocusConfig,
    /// Analysis pool size; defaults to `min(available_parallelism, 4)`.
    pub worker_threads: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_analysis_interval_ms: 200,
            suppress_after_detection_ms: 1000,
            focus: FocusConfig::default(),
            worker_threads: None,
        }
    }
}

impl SessionConfig {
    /// Short intervals for tests that drive real time.
    pub fn fast() -> Self {
        Self {
            min_analysis_interval_ms: 10,
            suppress_after_detection_ms: 50,
            focus: FocusConfig::default(),
            worker_threads: Some(1),
        }
    }
}

/// Handed to the caller after a successful initialize.
#[derive(Debug)]
pub struct SessionInfo {
    pub handle: Uuid,
    /// Capture resolution bound for the session's lifetime.
    pub resolution: Resolution,
    pub events: mpsc::UnboundedReceiver<ScanEvent>,
}

struct ActiveSession {
    handle: Uuid,
    runtime: Runtime,
    pipeline: Arc<DecodePipeline>,
    pause: Arc<PauseController>,
    focus: Arc<FocusScheduler>,
    forwarder: JoinHandle<()>,
    resolution: Resolution,
}

/// Owns one camera and at most one live scan session over it.
///
/// All control methods are synchronous; the analysis work runs on a dedicated
/// runtime owned by the active session, so callers never need a runtime of
/// their own.
pub struct SessionController {
    camera: Box<dyn FrameSource>,
    factory: Arc<dyn DecoderFactory>,
    display: DisplayMetrics,
    config: SessionConfig,
    /// Torch preference; survives rebinds so re-initialize restores it.
    flash_enabled: bool,
    active: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(
        camera: Box<dyn FrameSource>,
        factory: Arc<dyn DecoderFactory>,
        display: DisplayMetrics,
        config: SessionConfig,
    ) -> Self {
        Self {
            camera,
            factory,
            display,
            config,
            flash_enabled: false,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Resolution of the active session, if any.
    pub fn resolution(&self) -> Option<Resolution> {
        self.active.as_ref().map(|a| a.resolution)
    }

    /// Bind the camera and start scanning with the given options.
    ///
    /// An already-active controller is disposed and rebound. On failure the
    /// controller is left uninitialized and a later initialize may succeed.
    pub fn initialize(&mut self, options: &ScanOptions) -> Result<SessionInfo, SessionError> {
        if self.active.is_some() {
            debug!("re-initializing, disposing previous session");
            self.dispose();
        }

        let formats = options.resolved_formats();
        let decoder = self
            .factory
            .create(&formats)
            .map_err(|e| SessionError::Init(e.to_string()))?;

        let caps = DeviceCapabilities {
            display: self.display,
            supported: self.camera.supported_resolutions(),
        };
        let resolution = select_resolution(options.resolution_request(), &caps);

        let runtime = Builder::new_multi_thread()
            .worker_threads(self.worker_threads())
            .thread_name("scan-analysis")
            .enable_all()
            .build()
            .map_err(|e| SessionError::Init(format!("worker runtime: {e}")))?;

        let suppress_window = Duration::from_millis(self.config.suppress_after_detection_ms);
        let pause = Arc::new(PauseController::new(suppress_window));
        let throttle = Arc::new(FrameThrottle::new(self.config.min_analysis_interval_ms));

        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let pipeline = Arc::new(DecodePipeline::new(decoder, batch_tx));

        let forwarder = runtime.spawn(forward_results(
            batch_rx,
            event_tx,
            Arc::clone(&pause),
            suppress_window,
        ));

        // Capture-thread sink: gate checks are O(1) and non-blocking; a
        // rejected frame drops here and its buffer goes straight back to the
        // pool without crossing a thread boundary.
        let sink: FrameSink = {
            let pause = Arc::clone(&pause);
            let pipeline = Arc::clone(&pipeline);
            let analysis = runtime.handle().clone();
            Box::new(move |frame: Frame| {
                if !pause.is_running() {
                    return;
                }
                if !throttle.admit(frame.timestamp_ms()) {
                    return;
                }
                let pipeline = Arc::clone(&pipeline);
                analysis.spawn(async move {
                    pipeline.analyze(frame);
                });
            })
        };

        self.camera
            .start(CaptureConfig::new(resolution), sink)
            .map_err(|e| SessionError::Init(e.to_string()))?;

        let control = self.camera.control();
        if self.flash_enabled {
            if let Err(e) = control.set_torch(true) {
                warn!("could not restore torch state: {e}");
            }
        }

        let focus = Arc::new(FocusScheduler::new(
            control,
            Arc::clone(&pause),
            self.config.focus.clone(),
        ));
        if let Err(e) = focus.trigger_center_region() {
            warn!("initial focus sweep failed: {e}");
        }
        {
            let _guard = runtime.enter();
            focus.start_periodic();
        }

        let handle = Uuid::new_v4();
        info!(%handle, %resolution, formats = formats.len(), "scan session started");

        self.active = Some(ActiveSession {
            handle,
            runtime,
            pipeline,
            pause,
            focus,
            forwarder,
            resolution,
        });

        Ok(SessionInfo {
            handle,
            resolution,
            events: event_rx,
        })
    }

    /// Swap the decoder for one built from new options.
    ///
    /// In-flight frames finish on the old decoder; the capture resolution is
    /// not rebound.
    pub fn update_options(&self, options: &ScanOptions) -> Result<(), SessionError> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| SessionError::Options("no active session".into()))?;

        let formats = options.resolved_formats();
        let decoder = self
            .factory
            .create(&formats)
            .map_err(|e| SessionError::Options(e.to_string()))?;
        active.pipeline.replace_decoder(decoder);
        info!(formats = formats.len(), "scan options updated");
        Ok(())
    }

    /// Flip the torch; returns the new state.
    pub fn toggle_flash(&mut self) -> Result<bool, SessionError> {
        if self.active.is_none() {
            return Err(SessionError::Flash("no active session".into()));
        }
        let desired = !self.flash_enabled;
        self.camera
            .control()
            .set_torch(desired)
            .map_err(|e| SessionError::Flash(e.to_string()))?;
        self.flash_enabled = desired;
        Ok(desired)
    }

    /// Stop admitting frames until `resume`. No-op without a session.
    pub fn pause(&self) {
        if let Some(active) = &self.active {
            active.pause.pause();
            debug!("scanning paused");
        }
    }

    /// Re-admit frames after a pause. No-op without a session.
    pub fn resume(&self) {
        if let Some(active) = &self.active {
            active.pause.resume();
            debug!("scanning resumed");
        }
    }

    /// Focus at a normalized coordinate. Coordinate validation applies even
    /// without a session; actuator failures are logged, never raised.
    pub fn touch_to_focus(&self, x: f32, y: f32) -> Result<(), SessionError> {
        if !coordinate_in_range(x) || !coordinate_in_range(y) {
            return Err(SessionError::InvalidArgs(format!(
                "focus coordinate out of range: ({x}, {y})"
            )));
        }
        if let Some(active) = &self.active {
            match active.focus.trigger_at(x, y) {
                Ok(()) => {}
                Err(FocusError::InvalidCoordinate { x, y }) => {
                    return Err(SessionError::InvalidArgs(format!(
                        "focus coordinate out of range: ({x}, {y})"
                    )));
                }
                Err(e) => warn!("touch focus failed: {e}"),
            }
        }
        Ok(())
    }

    /// Tear the session down. Idempotent, bounded: in-flight decodes are
    /// abandoned, never awaited, and late results are discarded.
    pub fn dispose(&mut self) {
        if let Some(active) = self.active.take() {
            active.focus.stop();
            self.camera.stop();
            active.forwarder.abort();
            active.runtime.shutdown_background();
            info!(handle = %active.handle, "scan session disposed");
        }
    }

    fn worker_threads(&self) -> usize {
        self.config.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2)
                .min(MAX_WORKER_THREADS)
        })
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn coordinate_in_range(v: f32) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

/// Single consumer of decode batches: dedup, deliver, suppress.
///
/// Being the only reader of the batch channel serializes event delivery, so
/// the subscriber never sees two events at once even though decodes run
/// concurrently.
async fn forward_results(
    mut batches: mpsc::UnboundedReceiver<Vec<DetectionResult>>,
    events: mpsc::UnboundedSender<ScanEvent>,
    pause: Arc<PauseController>,
    dedup_window: Duration,
) {
    let mut last_delivered: Option<(Vec<String>, Instant)> = None;

    while let Some(batch) = batches.recv().await {
        let mut values: Vec<String> = batch.iter().map(|r| r.value.clone()).collect();
        values.sort();

        if let Some((previous, at)) = &last_delivered {
            if *previous == values && at.elapsed() < dedup_window {
                debug!("duplicate detection inside the suppression window, dropped");
                continue;
            }
        }
        last_delivered = Some((values, Instant::now()));

        if events
            .send(ScanEvent::BarcodeDetected { barcodes: batch })
            .is_err()
        {
            debug!("event receiver dropped, stopping delivery");
            break;
        }
        pause.notify_detection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decode_pipeline::{CornerPoint, RawBarcode, ScriptedDecoder, ScriptedFactory};
    use frame_capture::{
        BufferPool, CameraControl, FrameEmitter, MockCamera, MockControl, PixelFormat, Rotation,
    };
    use scan_config::{BarcodeFormat, DisplayOrientation};

    fn display() -> DisplayMetrics {
        DisplayMetrics {
            width_px: 1080,
            height_px: 2400,
            orientation: DisplayOrientation::Portrait,
        }
    }

    fn barcode(value: &str) -> RawBarcode {
        RawBarcode {
            value: Some(value.into()),
            format: BarcodeFormat::QrCode,
            corner_points: vec![CornerPoint::new(0, 0)],
        }
    }

    fn controller_with(
        decoder: ScriptedDecoder,
    ) -> (SessionController, FrameEmitter, Arc<MockControl>, Arc<ScriptedFactory>) {
        let camera = MockCamera::new();
        let emitter = camera.emitter();
        let control = camera.control_state();
        let factory = Arc::new(ScriptedFactory::new(Arc::new(decoder)));
        let controller = SessionController::new(
            Box::new(camera),
            Arc::clone(&factory) as Arc<dyn DecoderFactory>,
            display(),
            SessionConfig::fast(),
        );
        (controller, emitter, control, factory)
    }

    fn emit_frame(emitter: &FrameEmitter, pool: &BufferPool, timestamp_ms: u64) -> bool {
        let mut buffer = pool.acquire().unwrap();
        buffer.fill_from(&[7u8; 4]).unwrap();
        emitter.emit(Frame::new(
            buffer,
            PixelFormat::Luma8,
            Rotation::Deg0,
            2,
            2,
            timestamp_ms,
        ))
    }

    fn wait_for_event(events: &mut mpsc::UnboundedReceiver<ScanEvent>) -> Option<ScanEvent> {
        for _ in 0..300 {
            if let Ok(event) = events.try_recv() {
                return Some(event);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn initialize_binds_camera_and_seeds_focus() {
        let (mut controller, _emitter, control, factory) =
            controller_with(ScriptedDecoder::empty());

        let info = controller.initialize(&ScanOptions::default()).unwrap();
        assert!(controller.is_active());
        // Portrait display >= 1080 wide selects the tall preset.
        assert_eq!(info.resolution, Resolution::new(1080, 1920));
        assert_eq!(factory.created(), 1);
        assert_eq!(factory.last_formats().unwrap().len(), 13);

        // Initial wide sweep was issued before any periodic nudge.
        let actions = control.actions();
        assert!(!actions.is_empty());
        assert_eq!(actions[0].points.len(), 5);
    }

    #[test]
    fn detection_flows_end_to_end() {
        let (mut controller, emitter, _control, _factory) =
            controller_with(ScriptedDecoder::repeating(vec![barcode("hello")]));
        let mut info = controller.initialize(&ScanOptions::default()).unwrap();

        let pool = BufferPool::new(1, 4);
        assert!(emit_frame(&emitter, &pool, 0));

        let event = wait_for_event(&mut info.events).expect("no detection delivered");
        let ScanEvent::BarcodeDetected { barcodes } = event;
        assert_eq!(barcodes.len(), 1);
        assert_eq!(barcodes[0].value, "hello");

        // The frame's buffer is back in the pool once analysis finishes.
        for _ in 0..300 {
            if pool.available() == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn frames_are_suppressed_after_a_detection() {
        let (mut controller, emitter, _control, _factory) =
            controller_with(ScriptedDecoder::repeating(vec![barcode("sticker")]));
        let mut info = controller.initialize(&ScanOptions::default()).unwrap();

        let pool = BufferPool::new(1, 4);
        assert!(emit_frame(&emitter, &pool, 0));
        assert!(wait_for_event(&mut info.events).is_some());

        // Delivery has happened, so the suppression window is armed; a frame
        // emitted now is dropped at the gate and no second event appears.
        assert!(emit_frame(&emitter, &pool, 100));
        std::thread::sleep(Duration::from_millis(30));
        assert!(info.events.try_recv().is_err());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn init_failure_is_retryable() {
        let (mut controller, _emitter, _control, factory) =
            controller_with(ScriptedDecoder::empty());

        factory.set_fail(true);
        let err = controller.initialize(&ScanOptions::default()).unwrap_err();
        assert_eq!(err.code(), "INIT_ERROR");
        assert!(!controller.is_active());

        factory.set_fail(false);
        assert!(controller.initialize(&ScanOptions::default()).is_ok());
    }

    #[test]
    fn camera_start_failure_surfaces_as_init_error() {
        let camera = MockCamera::failing_start();
        let factory = Arc::new(ScriptedFactory::new(Arc::new(ScriptedDecoder::empty())));
        let mut controller = SessionController::new(
            Box::new(camera),
            factory as Arc<dyn DecoderFactory>,
            display(),
            SessionConfig::fast(),
        );

        let err = controller.initialize(&ScanOptions::default()).unwrap_err();
        assert_eq!(err.code(), "INIT_ERROR");
        assert!(!controller.is_active());
        controller.dispose();
    }

    #[test]
    fn dispose_is_idempotent_and_safe_without_initialize() {
        let (mut controller, emitter, _control, _factory) =
            controller_with(ScriptedDecoder::empty());
        controller.dispose();

        controller.initialize(&ScanOptions::default()).unwrap();
        controller.dispose();
        controller.dispose();
        assert!(!controller.is_active());

        // No subscriber remains; an emitted frame is released immediately.
        let pool = BufferPool::new(1, 4);
        assert!(!emit_frame(&emitter, &pool, 0));
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn toggle_flash_requires_a_session_and_remembers_state() {
        let (mut controller, _emitter, control, _factory) =
            controller_with(ScriptedDecoder::empty());

        let err = controller.toggle_flash().unwrap_err();
        assert_eq!(err.code(), "FLASH_ERROR");

        controller.initialize(&ScanOptions::default()).unwrap();
        assert!(controller.toggle_flash().unwrap());
        assert!(control.torch_enabled());

        // A rebind restores the remembered torch preference.
        control.set_torch(false).unwrap();
        controller.initialize(&ScanOptions::default()).unwrap();
        assert!(control.torch_enabled());

        assert!(!controller.toggle_flash().unwrap());
        assert!(!control.torch_enabled());
    }

    #[test]
    fn flash_actuator_failure_maps_to_flash_error() {
        let (mut controller, _emitter, control, _factory) =
            controller_with(ScriptedDecoder::empty());
        controller.initialize(&ScanOptions::default()).unwrap();

        control.set_fail_torch(true);
        let err = controller.toggle_flash().unwrap_err();
        assert_eq!(err.code(), "FLASH_ERROR");
    }

    #[test]
    fn update_options_swaps_the_decoder() {
        let (mut controller, _emitter, _control, factory) =
            controller_with(ScriptedDecoder::empty());

        let err = controller.update_options(&ScanOptions::default()).unwrap_err();
        assert_eq!(err.code(), "OPTIONS_ERROR");

        controller.initialize(&ScanOptions::default()).unwrap();
        let narrowed = ScanOptions {
            formats: vec!["ean13".into()],
            ..Default::default()
        };
        controller.update_options(&narrowed).unwrap();
        assert_eq!(factory.created(), 2);
        let formats = factory.last_formats().unwrap();
        assert_eq!(formats.len(), 1);
        assert!(formats.contains(&BarcodeFormat::Ean13));
    }

    #[test]
    fn touch_to_focus_validates_even_without_a_session() {
        let (mut controller, _emitter, control, _factory) =
            controller_with(ScriptedDecoder::empty());

        let err = controller.touch_to_focus(1.5, 0.5).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGS");
        // Valid coordinates without a session succeed silently.
        controller.touch_to_focus(0.5, 0.5).unwrap();

        controller.initialize(&ScanOptions::default()).unwrap();
        let before = control.actions().len();
        controller.touch_to_focus(0.25, 0.75).unwrap();
        let actions = control.actions();
        assert_eq!(actions.len(), before + 1);
        assert_eq!(actions.last().unwrap().auto_cancel, Duration::from_secs(5));
    }

    #[test]
    fn pause_and_resume_gate_the_frame_path() {
        let (mut controller, emitter, _control, _factory) =
            controller_with(ScriptedDecoder::repeating(vec![barcode("gated")]));
        let mut info = controller.initialize(&ScanOptions::default()).unwrap();

        controller.pause();
        let pool = BufferPool::new(1, 4);
        assert!(emit_frame(&emitter, &pool, 0));
        std::thread::sleep(Duration::from_millis(50));
        assert!(info.events.try_recv().is_err());
        // Paused frames never cross a thread boundary; the buffer is already back.
        assert_eq!(pool.available(), 1);

        controller.resume();
        assert!(emit_frame(&emitter, &pool, 1000));
        assert!(wait_for_event(&mut info.events).is_some());

        // Pause/resume without a session must not panic.
        controller.dispose();
        controller.pause();
        controller.resume();
    }

    #[tokio::test(start_paused = true)]
    async fn forwarder_drops_duplicates_inside_the_window() {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let pause = Arc::new(PauseController::default());
        let window = Duration::from_millis(1000);
        let task = tokio::spawn(forward_results(batch_rx, event_tx, pause, window));

        let batch = || {
            vec![DetectionResult {
                value: "twice".into(),
                format: BarcodeFormat::QrCode,
                corner_points: vec![],
            }]
        };

        batch_tx.send(batch()).unwrap();
        batch_tx.send(batch()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(event_rx.try_recv().is_ok());
        assert!(event_rx.try_recv().is_err());

        // Past the window the same values are reportable again.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        batch_tx.send(batch()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(event_rx.try_recv().is_ok());

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn forwarder_passes_distinct_batches_through() {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let pause = Arc::new(PauseController::default());
        let task = tokio::spawn(forward_results(
            batch_rx,
            event_tx,
            pause,
            Duration::from_millis(1000),
        ));

        for value in ["first", "second"] {
            batch_tx
                .send(vec![DetectionResult {
                    value: value.into(),
                    format: BarcodeFormat::Code128,
                    corner_points: vec![],
                }])
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(event_rx.try_recv().is_ok());
        assert!(event_rx.try_recv().is_ok());

        task.abort();
    }
}
