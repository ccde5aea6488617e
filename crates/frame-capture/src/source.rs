//! Frame-producing half of the camera capability.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::control::CameraControl;
use crate::frame::Frame;
use crate::CameraError;

/// Capture resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parameters a capture session is bound with. The resolution is fixed for
/// the lifetime of the binding.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub resolution: Resolution,
}

impl CaptureConfig {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }
}

/// Callback invoked on the capture thread for every produced frame.
///
/// Must not block: admission checks run inline and rejected frames are
/// released by dropping them before any thread boundary is crossed.
pub type FrameSink = Box<dyn FnMut(Frame) + Send>;

/// A camera-like frame producer with a single subscriber.
pub trait FrameSource: Send {
    /// Bind a capture session and register the subscriber.
    fn start(&mut self, config: CaptureConfig, sink: FrameSink) -> Result<(), CameraError>;

    /// Stop producing frames and drop the subscriber. Idempotent.
    fn stop(&mut self);

    /// Output sizes the hardware reports for still analysis.
    fn supported_resolutions(&self) -> Vec<Resolution>;

    fn control(&self) -> Arc<dyn CameraControl>;
}
