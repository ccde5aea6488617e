//! Autofocus scheduling.
//!
//! Many camera modules hunt for focus at infinity when pointed at a barcode
//! a hand-width away. The scheduler keeps nudging the focus actuator toward
//! the frame center so close-range codes stay sharp, and routes tap-to-focus
//! requests from the caller.

pub mod scheduler;

pub use scheduler::{FocusConfig, FocusScheduler};

use thiserror::Error;

use frame_capture::CameraError;

/// Focus scheduling error types
#[derive(Error, Debug)]
pub enum FocusError {
    #[error("focus coordinate out of range: ({x}, {y})")]
    InvalidCoordinate { x: f32, y: f32 },

    #[error(transparent)]
    Camera(#[from] CameraError),
}
