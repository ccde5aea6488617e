//! Torch and focus/metering control surface of the camera capability.

use std::time::Duration;

use crate::CameraError;

/// Normalized image coordinate used to bias autofocus/auto-exposure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteringPoint {
    pub x: f32,
    pub y: f32,
}

impl MeteringPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One autofocus/metering request.
///
/// The actuator keeps the action active until `auto_cancel` elapses or a new
/// action supersedes it; at most one action is ever active.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusAction {
    pub points: Vec<MeteringPoint>,
    pub auto_cancel: Duration,
}

impl FocusAction {
    /// Single point at frame center.
    pub fn center(auto_cancel: Duration) -> Self {
        Self {
            points: vec![MeteringPoint::new(0.5, 0.5)],
            auto_cancel,
        }
    }

    /// Single point at an arbitrary normalized coordinate.
    pub fn at(x: f32, y: f32, auto_cancel: Duration) -> Self {
        Self {
            points: vec![MeteringPoint::new(x, y)],
            auto_cancel,
        }
    }

    /// Center plus four offsets, covering the region where barcodes usually
    /// sit instead of a single center point.
    pub fn wide_center(auto_cancel: Duration) -> Self {
        Self {
            points: vec![
                MeteringPoint::new(0.5, 0.5),
                MeteringPoint::new(0.5, 0.3),
                MeteringPoint::new(0.5, 0.7),
                MeteringPoint::new(0.3, 0.5),
                MeteringPoint::new(0.7, 0.5),
            ],
            auto_cancel,
        }
    }
}

/// Control half of the camera capability: torch and focus actuator.
pub trait CameraControl: Send + Sync {
    fn set_torch(&self, enabled: bool) -> Result<(), CameraError>;

    /// Issue a focus/metering action, superseding any active one.
    fn start_focus_metering(&self, action: FocusAction) -> Result<(), CameraError>;

    fn cancel_focus_metering(&self) -> Result<(), CameraError>;
}
