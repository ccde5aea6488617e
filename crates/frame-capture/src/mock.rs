//! Scriptable camera for tests and demos.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::control::{CameraControl, FocusAction};
use crate::frame::Frame;
use crate::source::{CaptureConfig, FrameSink, FrameSource, Resolution};
use crate::CameraError;

struct SinkSlot {
    sink: Option<FrameSink>,
    config: Option<CaptureConfig>,
}

/// In-memory [`FrameSource`] that records control calls and lets a test (or
/// the demo binary) push frames into the registered sink.
pub struct MockCamera {
    control: Arc<MockControl>,
    supported: Vec<Resolution>,
    slot: Arc<Mutex<SinkSlot>>,
    fail_start: bool,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::with_supported(vec![
            Resolution::new(640, 480),
            Resolution::new(1280, 720),
            Resolution::new(1920, 1080),
            Resolution::new(2560, 1440),
        ])
    }

    pub fn with_supported(supported: Vec<Resolution>) -> Self {
        Self {
            control: Arc::new(MockControl::default()),
            supported,
            slot: Arc::new(Mutex::new(SinkSlot {
                sink: None,
                config: None,
            })),
            fail_start: false,
        }
    }

    /// Camera whose `start` always fails, for initialization-error paths.
    pub fn failing_start() -> Self {
        let mut camera = Self::new();
        camera.fail_start = true;
        camera
    }

    /// Handle for pushing frames into the subscriber, if one is registered.
    pub fn emitter(&self) -> FrameEmitter {
        FrameEmitter {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Recorded control state (torch, focus actions).
    pub fn control_state(&self) -> Arc<MockControl> {
        Arc::clone(&self.control)
    }

    /// Resolution the current binding was started with.
    pub fn bound_resolution(&self) -> Option<Resolution> {
        lock_slot(&self.slot).config.as_ref().map(|c| c.resolution)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockCamera {
    fn start(&mut self, config: CaptureConfig, sink: FrameSink) -> Result<(), CameraError> {
        if self.fail_start {
            return Err(CameraError::Open("scripted start failure".into()));
        }
        let mut slot = lock_slot(&self.slot);
        slot.sink = Some(sink);
        slot.config = Some(config);
        Ok(())
    }

    fn stop(&mut self) {
        let mut slot = lock_slot(&self.slot);
        slot.sink = None;
        slot.config = None;
    }

    fn supported_resolutions(&self) -> Vec<Resolution> {
        self.supported.clone()
    }

    fn control(&self) -> Arc<dyn CameraControl> {
        Arc::clone(&self.control) as Arc<dyn CameraControl>
    }
}

/// Pushes frames into the sink a [`MockCamera`] was started with.
#[derive(Clone)]
pub struct FrameEmitter {
    slot: Arc<Mutex<SinkSlot>>,
}

impl FrameEmitter {
    /// Deliver one frame. Returns false (and releases the frame) when no
    /// subscriber is registered.
    pub fn emit(&self, frame: Frame) -> bool {
        let mut slot = lock_slot(&self.slot);
        match slot.sink.as_mut() {
            Some(sink) => {
                sink(frame);
                true
            }
            None => {
                debug!("no subscriber registered, dropping frame");
                false
            }
        }
    }
}

fn lock_slot(slot: &Arc<Mutex<SinkSlot>>) -> MutexGuard<'_, SinkSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recorded torch/focus state behind the mock camera.
#[derive(Default)]
pub struct MockControl {
    torch: AtomicBool,
    fail_torch: AtomicBool,
    actions: Mutex<Vec<FocusAction>>,
    cancels: AtomicUsize,
}

impl MockControl {
    pub fn torch_enabled(&self) -> bool {
        self.torch.load(Ordering::SeqCst)
    }

    /// Make subsequent torch calls fail, for the flash error path.
    pub fn set_fail_torch(&self, fail: bool) {
        self.fail_torch.store(fail, Ordering::SeqCst);
    }

    /// Focus actions issued so far, oldest first.
    pub fn actions(&self) -> Vec<FocusAction> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl CameraControl for MockControl {
    fn set_torch(&self, enabled: bool) -> Result<(), CameraError> {
        if self.fail_torch.load(Ordering::SeqCst) {
            return Err(CameraError::Control("scripted torch failure".into()));
        }
        self.torch.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn start_focus_metering(&self, action: FocusAction) -> Result<(), CameraError> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
        Ok(())
    }

    fn cancel_focus_metering(&self) -> Result<(), CameraError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
